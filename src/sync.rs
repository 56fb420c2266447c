use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ParseError, Stage, SyncError};
use crate::fetcher::Fetcher;
use crate::normalizer::{normalize, NormalizeOptions};
use crate::parser::parse_feed;
use crate::region::{replace_region, RegionUpdate};
use crate::render::render_block;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Region content changed and the document was rewritten
    Written { entries: usize },
    /// Region already up to date, nothing written
    Unchanged { entries: usize },
    /// Nothing written; `document` is what would have been persisted
    DryRun {
        entries: usize,
        changed: bool,
        document: String,
    },
}

impl SyncOutcome {
    pub fn entries(&self) -> usize {
        match self {
            SyncOutcome::Written { entries }
            | SyncOutcome::Unchanged { entries }
            | SyncOutcome::DryRun { entries, .. } => *entries,
        }
    }
}

/// Runs parse, normalize and render over a feed body.
///
/// Returns the rendered block and how many entries it holds.
pub fn render_feed(
    body: &[u8],
    options: &NormalizeOptions,
) -> Result<(String, usize), ParseError> {
    let entries = parse_feed(body)?;
    info!("Parsed {} entries from feed", entries.len());

    let normalized = normalize(&entries, options);
    for entry in &normalized {
        debug!("  {} ({})", entry.title, entry.published_display);
    }
    if normalized.is_empty() {
        warn!("Feed has no entries, rendering placeholder");
    }

    Ok((render_block(&normalized), normalized.len()))
}

pub struct Synchronizer {
    config: Config,
    fetcher: Fetcher,
}

impl Synchronizer {
    pub fn new(config: Config) -> Result<Self, SyncError> {
        let fetcher = Fetcher::new(config.timeout(), &config.user_agent)?;
        Ok(Self { config, fetcher })
    }

    /// Fetches the feed and rewrites the document region if it changed.
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        let (update, entries) = self.prepare().await?;

        if !update.changed {
            info!(
                "{} already up to date, skipping write",
                self.config.document.display()
            );
            return Ok(SyncOutcome::Unchanged { entries });
        }

        write_atomic(&self.config.document, &update.content).map_err(|source| SyncError::Io {
            stage: Stage::Write,
            path: self.config.document.clone(),
            source,
        })?;
        info!(
            "Updated {} with {} entries",
            self.config.document.display(),
            entries
        );

        Ok(SyncOutcome::Written { entries })
    }

    /// Same pipeline as [`run`](Self::run) but never touches the document.
    pub async fn preview(&self) -> Result<SyncOutcome, SyncError> {
        let (update, entries) = self.prepare().await?;
        Ok(SyncOutcome::DryRun {
            entries,
            changed: update.changed,
            document: update.content,
        })
    }

    async fn prepare(&self) -> Result<(RegionUpdate, usize), SyncError> {
        let config = &self.config;

        // Read first so a missing document fails before any request
        let document =
            std::fs::read_to_string(&config.document).map_err(|source| SyncError::Io {
                stage: Stage::Read,
                path: config.document.clone(),
                source,
            })?;
        debug!("Read {} bytes from {}", document.len(), config.document.display());

        let body = self.fetcher.fetch(&config.feed_url).await?;

        let options = NormalizeOptions {
            max_entries: config.max_entries,
            max_summary_chars: config.max_summary_chars,
        };
        let (block, entries) = render_feed(&body, &options)?;

        let update = replace_region(&document, &config.start_marker, &config.end_marker, &block)?;
        Ok((update, entries))
    }
}

/// Replaces `path` with `content` through a temp file in the same directory,
/// so readers see either the old or the new document and never a partial one.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NO_POSTS_LINE;

    const TWO_ENTRY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>x</title>
  <item>
    <title>B</title>
    <link>http://x/b</link>
    <pubDate>Mon, 09 Dec 2024 12:00:00 GMT</pubDate>
    <description>&lt;p&gt;Second &lt;b&gt;post&lt;/b&gt;&lt;/p&gt;</description>
  </item>
  <item>
    <title>A</title>
    <link>http://x/a</link>
    <pubDate>sometime last week</pubDate>
    <description><![CDATA[<p>First post</p>]]></description>
  </item>
</channel></rss>"#;

    #[test]
    fn test_render_feed_two_entries() {
        let (block, entries) =
            render_feed(TWO_ENTRY_FEED.as_bytes(), &NormalizeOptions::default()).unwrap();

        assert_eq!(entries, 2);
        assert_eq!(
            block,
            "\n- [B](http://x/b) - *December 09, 2024*\n  > Second post\n\n\
             - [A](http://x/a) - *Recent*\n  > First post\n\n"
        );
        assert!(!block.contains("<p>"));
    }

    #[test]
    fn test_render_feed_respects_max_entries() {
        let options = NormalizeOptions {
            max_entries: 1,
            ..Default::default()
        };
        let (block, entries) = render_feed(TWO_ENTRY_FEED.as_bytes(), &options).unwrap();

        assert_eq!(entries, 1);
        assert!(block.contains("[B]"));
        assert!(!block.contains("[A]"));
    }

    #[test]
    fn test_render_feed_empty_channel() {
        let xml = "<rss><channel><title>empty</title></channel></rss>";
        let (block, entries) = render_feed(xml.as_bytes(), &NormalizeOptions::default()).unwrap();

        assert_eq!(entries, 0);
        assert!(block.contains(NO_POSTS_LINE));
    }

    #[test]
    fn test_render_feed_not_a_feed() {
        let result = render_feed(b"<html><body></body></html>", &NormalizeOptions::default());
        assert!(matches!(result, Err(ParseError::NotAFeed)));
    }

    #[test]
    fn test_outcome_entries() {
        assert_eq!(SyncOutcome::Written { entries: 3 }.entries(), 3);
        assert_eq!(SyncOutcome::Unchanged { entries: 0 }.entries(), 0);
    }

    mod write_atomic_tests {
        use super::*;

        #[test]
        fn test_replaces_content() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("README.md");
            std::fs::write(&path, "old").unwrap();

            write_atomic(&path, "new content\n").unwrap();

            assert_eq!(std::fs::read_to_string(&path).unwrap(), "new content\n");
        }

        #[test]
        fn test_leaves_no_temp_files() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("README.md");
            std::fs::write(&path, "old").unwrap();

            write_atomic(&path, "new").unwrap();

            let names: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .collect();
            assert_eq!(names, vec![std::ffi::OsString::from("README.md")]);
        }

        #[cfg(unix)]
        #[test]
        fn test_keeps_permissions() {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("README.md");
            std::fs::write(&path, "old").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

            write_atomic(&path, "new").unwrap();

            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }

        #[test]
        fn test_missing_directory_fails() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("missing").join("README.md");
            assert!(write_atomic(&path, "x").is_err());
        }
    }
}
