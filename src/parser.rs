//! Pull-parser over RSS 2.0, RSS 1.0 (RDF) and Atom documents.
//!
//! Only the four fields the README block needs are kept, as raw strings.
//! A missing or odd field leaves that field empty on its entry; the whole
//! parse fails only when the body is not well-formed XML or has no feed
//! container at all.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::ParseError;

const CONTAINER_TAGS: &[&[u8]] = &[b"rss", b"RDF", b"feed", b"channel"];
const ITEM_TAGS: &[&[u8]] = &[b"item", b"entry"];

/// One item of the feed, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published_raw: Option<String>,
    pub summary_raw: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Guid,
    Published,
    Updated,
    Summary,
    Content,
}

enum FieldSource {
    /// Value is the element's text content
    Text(Field),
    /// Value was carried in an attribute (Atom `<link href>`)
    Attribute(Field, String),
}

#[derive(Default)]
struct EntryBuilder {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<String>,
    content: Option<String>,
}

impl EntryBuilder {
    /// First non-blank value for a field wins.
    fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Guid => &mut self.guid,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn build(self) -> FeedEntry {
        let link = self.link.or_else(|| {
            self.guid
                .filter(|g| g.starts_with("http://") || g.starts_with("https://"))
        });

        FeedEntry {
            title: self.title,
            link,
            published_raw: self.published.or(self.updated),
            summary_raw: self.summary.or(self.content),
        }
    }
}

struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

struct OpenItem {
    builder: EntryBuilder,
    depth: usize,
    capture: Option<Capture>,
}

#[derive(Default)]
struct Scanner {
    found_container: bool,
    /// Locked to `item` or `entry` once the first one is seen
    item_tag: Option<Vec<u8>>,
    item: Option<OpenItem>,
    entries: Vec<FeedEntry>,
}

impl Scanner {
    fn open(&mut self, e: &BytesStart<'_>, depth: usize, self_closing: bool) {
        let local = e.local_name();
        let name = local.as_ref();

        let Some(item) = self.item.as_mut() else {
            self.open_outside_item(name, depth, self_closing);
            return;
        };

        if item.capture.is_some() || depth != item.depth + 1 {
            return;
        }

        match field_source(name, e) {
            Some(FieldSource::Attribute(field, value)) => item.builder.set(field, &value),
            Some(FieldSource::Text(field)) if !self_closing => {
                item.capture = Some(Capture {
                    field,
                    depth,
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn open_outside_item(&mut self, name: &[u8], depth: usize, self_closing: bool) {
        if CONTAINER_TAGS.iter().any(|tag| *tag == name) {
            self.found_container = true;
            return;
        }

        let is_item = match &self.item_tag {
            Some(tag) => tag.as_slice() == name,
            None => ITEM_TAGS.iter().any(|tag| *tag == name),
        };
        if !self.found_container || !is_item {
            return;
        }

        if self.item_tag.is_none() {
            debug!("Feed uses <{}> items", String::from_utf8_lossy(name));
            self.item_tag = Some(name.to_vec());
        }

        if self_closing {
            self.entries.push(EntryBuilder::default().build());
        } else {
            self.item = Some(OpenItem {
                builder: EntryBuilder::default(),
                depth,
                capture: None,
            });
        }
    }

    fn text(&mut self, text: &str) {
        let Some(capture) = self.item.as_mut().and_then(|i| i.capture.as_mut()) else {
            return;
        };
        if !capture.text.is_empty() {
            capture.text.push(' ');
        }
        capture.text.push_str(text);
    }

    fn close(&mut self, depth: usize) {
        let Some(item) = self.item.as_mut() else {
            return;
        };

        if item.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = item.capture.take() {
                item.builder.set(capture.field, &capture.text);
            }
        }

        if depth == item.depth {
            if let Some(item) = self.item.take() {
                self.entries.push(item.builder.build());
            }
        }
    }

    fn finish(mut self) -> Result<Vec<FeedEntry>, ParseError> {
        if !self.found_container {
            return Err(ParseError::NotAFeed);
        }
        // An unterminated trailing item still yields what it had
        if let Some(item) = self.item.take() {
            self.entries.push(item.builder.build());
        }
        Ok(self.entries)
    }
}

fn field_source(name: &[u8], e: &BytesStart<'_>) -> Option<FieldSource> {
    let field = match name {
        b"title" => Field::Title,
        b"link" => {
            return match attribute(e, b"href") {
                Some(href) => {
                    let rel = attribute(e, b"rel");
                    let is_alternate = rel.as_deref().map_or(true, |r| r == "alternate");
                    is_alternate.then_some(FieldSource::Attribute(Field::Link, href))
                }
                None => Some(FieldSource::Text(Field::Link)),
            };
        }
        b"guid" => {
            if attribute(e, b"isPermaLink").as_deref() == Some("false") {
                return None;
            }
            Field::Guid
        }
        b"pubDate" | b"published" | b"date" | b"issued" => Field::Published,
        b"updated" | b"modified" => Field::Updated,
        b"description" | b"summary" => Field::Summary,
        b"content" | b"encoded" => Field::Content,
        _ => return None,
    };
    Some(FieldSource::Text(field))
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parses raw feed bytes into entries, in document order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut scanner = Scanner::default();
    let mut buf = Vec::new();
    let mut depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                scanner.open(&e, depth, false);
            }
            Ok(Event::Empty(e)) => scanner.open(&e, depth + 1, true),
            Ok(Event::End(_)) => {
                scanner.close(depth);
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                // Unknown HTML entities (&nbsp;) are left for the normalizer
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                scanner.text(&text);
            }
            Ok(Event::CData(c)) => scanner.text(&String::from_utf8_lossy(&c)),
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let entries = scanner.finish()?;
    debug!("Parsed {} entries", entries.len());
    Ok(entries)
}
