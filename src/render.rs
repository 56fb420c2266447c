use std::fmt::Write;

use crate::normalizer::NormalizedEntry;

pub const NO_POSTS_LINE: &str = "- No blog posts available at the moment.";

/// Builds the text placed strictly between the region markers.
///
/// The block opens with a newline so the start marker keeps a line of its
/// own, and every entry is followed by a blank line, which leaves the end
/// marker on its own line too. Entries without a summary get no quote line.
pub fn render_block(entries: &[NormalizedEntry]) -> String {
    let mut block = String::from("\n");

    if entries.is_empty() {
        block.push_str(NO_POSTS_LINE);
        block.push('\n');
        return block;
    }

    for entry in entries {
        // Writing into a String cannot fail
        let _ = writeln!(
            block,
            "- [{}]({}) - *{}*",
            entry.title, entry.link, entry.published_display
        );
        if !entry.summary_display.is_empty() {
            let _ = writeln!(block, "  > {}", entry.summary_display);
        }
        block.push('\n');
    }

    block
}
