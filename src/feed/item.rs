use chrono::{DateTime, FixedOffset, Local};

use crate::util::format_date_key;

/// Date key used in item ids when `pubDate` cannot be parsed.
pub const INVALID_DATE_KEY: &str = "000000";

/// Text shown in place of a date that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

/// Child text of one RSS `<item>` element, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub description: Option<String>,
}

/// Category icon derived from an item title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedIcon {
    Tornado,
    Watch,
    Meso,
    Outlook,
    Default,
}

impl FeedIcon {
    /// Classification order. The first keyword found in the title wins.
    const PRIORITY: [(&'static str, FeedIcon); 4] = [
        ("tornado", FeedIcon::Tornado),
        ("watch", FeedIcon::Watch),
        ("meso", FeedIcon::Meso),
        ("outlook", FeedIcon::Outlook),
    ];

    /// Classify a title by case-insensitive keyword match.
    pub fn classify(title: &str) -> Self {
        let lowered = title.to_lowercase();
        Self::PRIORITY
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map_or(FeedIcon::Default, |(_, icon)| *icon)
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Tornado => "🌪️",
            Self::Watch => "🕒",
            Self::Meso => "🌀",
            Self::Outlook => "🧭",
            Self::Default => "📄",
        }
    }
}

/// A single entry from the SPC RSS feed.
///
/// Only the four raw fields are stored; icon, dates and id are derived on
/// demand so that identical input always yields identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub pub_date_raw: String,
    pub description: String,
}

impl FeedItem {
    /// Apply field defaults to a raw item. Never fails.
    ///
    /// Empty strings count as missing, so an empty `<title/>` becomes
    /// `"No title"` and an empty `<link/>` becomes `"#"`.
    pub fn parse(raw: RawItem) -> Self {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|s| !s.is_empty())
        }

        Self {
            title: present(raw.title).unwrap_or_else(|| "No title".to_string()),
            link: present(raw.link).unwrap_or_else(|| "#".to_string()),
            pub_date_raw: raw.pub_date.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
        }
    }

    pub fn icon(&self) -> FeedIcon {
        FeedIcon::classify(&self.title)
    }

    /// Best-effort parse of `pubDate`: RFC 2822 as RSS requires, RFC 3339 as
    /// a fallback for feeds that emit ISO timestamps.
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.pub_date_raw.trim();
        if raw.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }

    /// Unix timestamp used for newest-first ordering.
    ///
    /// `None` means the date could not be parsed; such items sort after every
    /// dated item.
    pub fn sort_time(&self) -> Option<i64> {
        self.published().map(|dt| dt.timestamp())
    }

    /// Local-time rendering such as `6/7/2024, 3:47:00 PM`.
    pub fn display_date(&self) -> String {
        match self.published() {
            Some(dt) => dt
                .with_timezone(&Local)
                .format("%-m/%-d/%Y, %-I:%M:%S %p")
                .to_string(),
            None => INVALID_DATE.to_string(),
        }
    }

    /// Stable identity key: whitespace-free title, `-`, local `YYMMDD` key.
    ///
    /// Not unique: two items with the same title published on the same
    /// local day share an id. Kept as-is because expanded-state and
    /// bookmarks are keyed on this exact scheme.
    pub fn id(&self) -> String {
        let stripped: String = self.title.chars().filter(|c| !c.is_whitespace()).collect();
        let key = self.published().map_or_else(
            || INVALID_DATE_KEY.to_string(),
            |dt| format_date_key(&dt.with_timezone(&Local), 0),
        );
        format!("{}-{}", stripped, key)
    }
}

/// Newest-first ordering for feed items.
///
/// Dated items come before undated ones. `slice::sort_by` is stable, so ties
/// keep document order.
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_by(|a, b| match (a.sort_time(), b.sort_time()) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
