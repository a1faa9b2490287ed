//! Feed retrieval and deserialization.
//!
//! - **Items**: RSS `<item>` records into [`FeedItem`]s with derived icon, dates and id
//! - **Reports**: SPC storm-report CSV into tornado, wind and hail tables
//! - **Fetching**: the [`TextSource`] seam and its reqwest implementation
//!
//! Parsing never fails outright. Missing XML fields fall back to defaults and
//! malformed CSV lines pass through verbatim, so a widget always has
//! something to render.

mod fetcher;
mod item;
mod report;

use quick_xml::events::Event;
use quick_xml::Reader;

pub use fetcher::{decode_payload, FetchError, HttpTextSource, TextSource};
pub use item::{sort_newest_first, FeedIcon, FeedItem, RawItem, INVALID_DATE, INVALID_DATE_KEY};
pub use report::{ReportCategory, ReportSet, ReportTable};

/// The `<item>` children we extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    PubDate,
    Description,
}

impl ItemField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }

    fn slot(self, raw: &mut RawItem) -> &mut Option<String> {
        match self {
            Self::Title => &mut raw.title,
            Self::Link => &mut raw.link,
            Self::PubDate => &mut raw.pub_date,
            Self::Description => &mut raw.description,
        }
    }
}

/// Field currently being read: which one, its text so far, and how many
/// nested elements deep we are inside it.
struct OpenField {
    field: ItemField,
    text: String,
    nested: usize,
}

/// Extract every `<item>` in an RSS document, in document order.
///
/// Items may appear at any depth. For each item the first `title`, `link`,
/// `pubDate` and `description` descendant is taken; text and CDATA content
/// are concatenated like DOM `textContent`. A document that stops parsing
/// part-way yields the items completed before the error.
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations, so
/// external-entity payloads in a hostile feed stay inert.
pub fn parse_items(xml: &str) -> Vec<FeedItem> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut open: Option<OpenField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if let Some(field) = open.as_mut() {
                    field.nested += 1;
                } else if current.is_some() {
                    if let Some(field) = ItemField::from_name(name.as_ref()) {
                        open = Some(OpenField {
                            field,
                            text: String::new(),
                            nested: 0,
                        });
                    }
                } else if name.as_ref() == b"item" {
                    current = Some(RawItem::default());
                }
            }
            Ok(Event::Empty(e)) => {
                if open.is_none() {
                    if let (Some(raw), Some(field)) =
                        (current.as_mut(), ItemField::from_name(e.local_name().as_ref()))
                    {
                        field.slot(raw).get_or_insert_with(String::new);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = open.as_mut() {
                    match t.unescape() {
                        Ok(text) => field.text.push_str(&text),
                        // Unknown entities (e.g. &nbsp;) keep their raw spelling
                        Err(_) => field.text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(field) = open.as_mut() {
                    field.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if let Some(mut field) = open.take() {
                    if field.nested > 0 {
                        field.nested -= 1;
                        open = Some(field);
                    } else if let Some(raw) = current.as_mut() {
                        let slot = field.field.slot(raw);
                        if slot.is_none() {
                            *slot = Some(field.text);
                        }
                    }
                } else if e.local_name().as_ref() == b"item" {
                    if let Some(raw) = current.take() {
                        items.push(FeedItem::parse(raw));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    parsed = items.len(),
                    "Malformed feed XML, keeping items parsed so far"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPC_RSS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<rss version="2.0">
<channel>
  <title>Storm Prediction Center</title>
  <link>https://www.spc.noaa.gov/</link>
  <item>
    <title>SPC Tornado Watch 412</title>
    <link>https://www.spc.noaa.gov/products/watch/ww0412.html</link>
    <description><![CDATA[<pre>Tornado Watch Number 412</pre>]]></description>
    <pubDate>Fri, 07 Jun 2024 18:05:00 +0000</pubDate>
  </item>
  <item>
    <title>SPC MD 1201 &amp; more</title>
    <description>Areas affected &lt;b&gt;</description>
    <pubDate>Fri, 07 Jun 2024 17:00:00 +0000</pubDate>
  </item>
  <item>
    <link/>
  </item>
</channel>
</rss>"#;

    #[test]
    fn test_parse_items_reads_all_items_in_order() {
        let items = parse_items(SPC_RSS);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "SPC Tornado Watch 412");
        assert_eq!(
            items[0].link,
            "https://www.spc.noaa.gov/products/watch/ww0412.html"
        );
        assert_eq!(items[0].description, "<pre>Tornado Watch Number 412</pre>");
        assert_eq!(items[0].pub_date_raw, "Fri, 07 Jun 2024 18:05:00 +0000");
    }

    #[test]
    fn test_parse_items_unescapes_and_defaults() {
        let items = parse_items(SPC_RSS);
        assert_eq!(items[1].title, "SPC MD 1201 & more");
        assert_eq!(items[1].link, "#");
        assert_eq!(items[1].description, "Areas affected <b>");

        assert_eq!(items[2].title, "No title");
        assert_eq!(items[2].link, "#");
        assert_eq!(items[2].pub_date_raw, "");
    }

    #[test]
    fn test_channel_fields_are_not_items() {
        let items = parse_items(SPC_RSS);
        assert!(items.iter().all(|i| i.title != "Storm Prediction Center"));
    }

    #[test]
    fn test_first_field_occurrence_wins() {
        let xml = "<rss><item><title>First</title><title>Second</title></item></rss>";
        let items = parse_items(xml);
        assert_eq!(items[0].title, "First");
    }

    #[test]
    fn test_nested_markup_in_field_is_flattened() {
        let xml = "<rss><item><description>a<b>bold</b>c</description></item></rss>";
        let items = parse_items(xml);
        assert_eq!(items[0].description, "aboldc");
    }

    #[test]
    fn test_malformed_document_keeps_completed_items() {
        let xml = "<rss><item><title>Kept</title></item><item><title>Broken</wrong></item>";
        let items = parse_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
    }

    #[test]
    fn test_non_feed_input_yields_nothing() {
        assert!(parse_items("").is_empty());
        assert!(parse_items("not xml at all").is_empty());
        assert!(parse_items("<html><body>Blocked</body></html>").is_empty());
    }
}
