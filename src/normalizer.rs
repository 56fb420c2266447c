use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use html_escape::decode_html_entities;
use regex::Regex;
use tracing::trace;

use crate::parser::FeedEntry;

pub const UNTITLED: &str = "Untitled";
pub const NO_LINK: &str = "#";
pub const UNKNOWN_DATE: &str = "Recent";
pub const ELLIPSIS: &str = "...";

const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";

/// An entry ready for rendering. Title, link and date are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub title: String,
    pub link: String,
    pub published_display: String,
    pub summary_display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_entries: usize,
    pub max_summary_chars: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_entries: 5,
            max_summary_chars: 150,
        }
    }
}

/// Keeps the first `max_entries` entries and fills every field, never failing.
pub fn normalize(entries: &[FeedEntry], options: &NormalizeOptions) -> Vec<NormalizedEntry> {
    entries
        .iter()
        .take(options.max_entries)
        .map(|entry| normalize_entry(entry, options.max_summary_chars))
        .collect()
}

pub fn normalize_entry(entry: &FeedEntry, max_summary_chars: usize) -> NormalizedEntry {
    let title = entry
        .title
        .as_deref()
        .map(clean_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let link = entry
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(NO_LINK)
        .to_string();

    let published_display = entry
        .published_raw
        .as_deref()
        .and_then(format_date)
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let summary_display = entry
        .summary_raw
        .as_deref()
        .map(|s| truncate_chars(&strip_markup(s), max_summary_chars).into_owned())
        .unwrap_or_default();

    NormalizedEntry {
        title,
        link,
        published_display,
        summary_display,
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Comments and known HTML elements only, so `Vec<T>` or `a < b > c` survive.
fn html_tag_pattern() -> &'static Regex {
    static HTML_TAG: OnceLock<Regex> = OnceLock::new();
    HTML_TAG.get_or_init(|| {
        Regex::new(concat!(
            r"(?s)<!--.*?-->|</?(?:",
            r"a|abbr|article|aside|audio|b|blockquote|br|caption|cite|code|dd|del|details|",
            r"div|dl|dt|em|figcaption|figure|footer|h[1-6]|header|hr|i|iframe|img|ins|kbd|",
            r"li|mark|nav|ol|p|picture|pre|q|s|script|section|small|source|span|strong|",
            r"style|sub|summary|sup|table|tbody|td|th|thead|tr|u|ul|video",
            r")\b[^<>]*>",
        ))
        .expect("html tag pattern is valid")
    })
}

/// Removes markup from a summary and collapses whitespace.
///
/// Every `<...>` span in the raw text is markup. Entities are decoded after
/// that, and a second pass drops only recognizable HTML left over from
/// double-escaped feeds (`&lt;p&gt;`), so escaped text like `&lt;T&gt;`
/// reaches the output as `<T>`. This is a regex heuristic, not an HTML
/// parser: nested or malformed tags are removed on a best-effort basis, and
/// a lone `<` with no closing `>` is kept as text.
pub fn strip_markup(raw: &str) -> String {
    let stripped = tag_pattern().replace_all(raw, "");
    let decoded = decode_html_entities(&stripped);
    let cleaned = html_tag_pattern().replace_all(&decoded, "");
    collapse_whitespace(&cleaned)
}

/// Titles are plain text, so only entities and recognizable HTML are touched.
pub fn clean_title(raw: &str) -> String {
    let decoded = decode_html_entities(raw);
    let cleaned = html_tag_pattern().replace_all(&decoded, "");
    collapse_whitespace(&cleaned)
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `s` to `max_chars` characters plus [`ELLIPSIS`] when it is longer.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
        None => Cow::Borrowed(s),
    }
}

type DateParser = fn(&str) -> Option<NaiveDate>;

fn rfc2822(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.date_naive())
}

fn rfc3339(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn iso8601_local(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// `UTC` is not an RFC 2822 zone name, but feeds use it anyway.
fn rfc1123_utc(s: &str) -> Option<NaiveDate> {
    let s = s.strip_suffix("UTC")?.trim_end();
    rfc1123_no_zone(s).or_else(|| rfc1123_no_weekday(s))
}

fn rfc1123_no_zone(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn rfc1123_no_weekday(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%d %b %Y %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn rfc1123_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%a, %d %b %Y").ok()
}

fn iso8601_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Tried in order; the first parser that accepts the input wins.
const DATE_FORMATS: &[(&str, DateParser)] = &[
    ("rfc2822", rfc2822),
    ("rfc1123-utc", rfc1123_utc),
    ("rfc3339", rfc3339),
    ("iso8601-local", iso8601_local),
    ("rfc1123-no-zone", rfc1123_no_zone),
    ("rfc1123-no-weekday", rfc1123_no_weekday),
    ("rfc1123-date", rfc1123_date),
    ("iso8601-date", iso8601_date),
];

/// Calendar date of a zoned timestamp is taken in its own offset, never the
/// local or UTC zone, so the same input always renders the same day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|(name, parse)| {
        let date = parse(raw)?;
        trace!("Parsed date {:?} as {}", raw, name);
        Some(date)
    })
}

pub fn format_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
}
