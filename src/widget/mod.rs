//! Dashboard widgets.
//!
//! Every widget owns a [`WidgetCore`] (id, heading, lifecycle flags and the
//! [`Panel`] the UI draws) plus variant-specific cached data. Four variants
//! implement the [`Widget`] trait:
//!
//! - [`StaticImage`]: a single storm-report image, resolved at refresh
//! - [`InteractiveMap`]: an embedded report map, re-created on every show
//! - [`RssFeed`]: the SPC RSS feed, fetched and sorted newest-first
//! - [`CsvTable`]: the storm-report CSV, decoded and split into three tables
//!
//! Network refreshes never block the caller. [`Widget::show`] hands back a
//! [`RefreshJob`] that the UI spawns; the [`CompletedRefresh`] comes back
//! through the event channel and is applied with [`Widget::finish_refresh`].

mod csv_table;
mod map;
mod rss;
mod static_image;

use chrono::{DateTime, Local};

use crate::config::{
    Config, REPORTS_MAP_ID, REPORT_TABLES_ID, RSS_FEED_ID, STORM_REPORTS_ID,
};
use crate::feed::{
    decode_payload, parse_items, sort_newest_first, FeedItem, FetchError, ReportTable, TextSource,
};

pub use csv_table::CsvTable;
pub use map::InteractiveMap;
pub use rss::RssFeed;
pub use static_image::StaticImage;

/// Message rendered when a network widget has nothing to show.
pub const FAILED_TO_LOAD: &str = "Failed to load feed.";

/// Source of "now" for URL templates. Swappable in tests.
pub type Clock = fn() -> DateTime<Local>;

// ============================================================================
// Panel model
// ============================================================================

/// One of the three categorized storm-report tables, titled for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledTable {
    pub title: String,
    pub table: ReportTable,
}

/// What a panel currently renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelContent {
    /// Hidden or never populated
    #[default]
    Empty,
    /// First refresh still in flight
    Loading,
    Image {
        url: String,
    },
    Frame {
        url: String,
    },
    Message(String),
    Feed(Vec<FeedItem>),
    Tables(Vec<TitledTable>),
}

/// Heading, visibility and rendered content of one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub visible: bool,
    pub heading: String,
    pub content: PanelContent,
}

// ============================================================================
// Refresh jobs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshKind {
    /// RSS XML, parsed and sorted
    Feed,
    /// Possibly base64-encoded CSV, decoded
    Report,
}

/// A pending network refresh for one widget.
///
/// Jobs own everything they need, so they can be moved into a spawned task
/// while the dashboard stays with the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshJob {
    pub widget_id: String,
    pub url: String,
    kind: RefreshKind,
}

/// Result of a finished [`RefreshJob`], ready for [`Widget::finish_refresh`].
#[derive(Debug)]
pub struct CompletedRefresh {
    pub widget_id: String,
    pub outcome: RefreshOutcome,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Feed(Result<Vec<FeedItem>, FetchError>),
    Report(Result<String, FetchError>),
}

impl RefreshJob {
    /// Fetch and deserialize. Parsing is done here, off the UI task.
    pub async fn run(self, source: &dyn TextSource) -> CompletedRefresh {
        tracing::debug!(widget = %self.widget_id, url = %self.url, "Refreshing widget");
        let fetched = source.fetch_text(&self.url).await;

        let outcome = match self.kind {
            RefreshKind::Feed => RefreshOutcome::Feed(fetched.map(|xml| {
                let mut items = parse_items(&xml);
                sort_newest_first(&mut items);
                items
            })),
            RefreshKind::Report => {
                RefreshOutcome::Report(fetched.map(|payload| decode_payload(&payload)))
            }
        };

        CompletedRefresh {
            widget_id: self.widget_id,
            outcome,
        }
    }
}

// ============================================================================
// Widget contract
// ============================================================================

/// State shared by every widget variant.
#[derive(Debug, Clone)]
pub struct WidgetCore {
    pub id: String,
    pub initialized: bool,
    /// A refresh job has been handed out and not yet finished.
    pub refreshing: bool,
    pub panel: Panel,
}

impl WidgetCore {
    pub fn new(id: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initialized: false,
            refreshing: false,
            panel: Panel {
                visible: false,
                heading: heading.into(),
                content: PanelContent::Empty,
            },
        }
    }

    /// Hand out a network job unless one is already in flight.
    fn start_job(&mut self, url: &str, kind: RefreshKind) -> Option<RefreshJob> {
        if self.refreshing {
            tracing::debug!(widget = %self.id, "Refresh already in flight, skipping");
            return None;
        }
        self.refreshing = true;
        Some(RefreshJob {
            widget_id: self.id.clone(),
            url: url.to_string(),
            kind,
        })
    }
}

/// Lifecycle shared by all dashboard widgets.
pub trait Widget: Send {
    fn core(&self) -> &WidgetCore;
    fn core_mut(&mut self) -> &mut WidgetCore;

    /// Start a refresh.
    ///
    /// Local variants finish synchronously (setting `initialized`) and return
    /// `None`. Network variants return a job, or `None` while one is in flight.
    fn begin_refresh(&mut self) -> Option<RefreshJob>;

    /// Store a job outcome in the cache. Returns whether it succeeded.
    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> bool;

    /// Render cached data into the panel.
    fn populate(&mut self);

    fn id(&self) -> &str {
        &self.core().id
    }

    fn is_initialized(&self) -> bool {
        self.core().initialized
    }

    fn is_refreshing(&self) -> bool {
        self.core().refreshing
    }

    fn panel(&self) -> &Panel {
        &self.core().panel
    }

    /// Apply a completed refresh.
    ///
    /// The cache and `initialized` are updated even when the panel is hidden,
    /// but only a visible panel is re-rendered.
    fn finish_refresh(&mut self, outcome: RefreshOutcome) {
        self.core_mut().refreshing = false;
        let ok = self.apply_outcome(outcome);
        self.core_mut().initialized = ok;
        if self.core().panel.visible {
            self.populate();
        }
    }

    /// Reveal the panel, refreshing first when not yet initialized.
    fn show(&mut self) -> Option<RefreshJob> {
        self.core_mut().panel.visible = true;
        if self.is_initialized() {
            self.populate();
            return None;
        }

        let job = self.begin_refresh();
        if self.is_initialized() {
            self.populate();
        } else {
            self.core_mut().panel.content = PanelContent::Loading;
        }
        job
    }

    /// Give up on an in-flight refresh whose result will never arrive.
    fn abort_refresh(&mut self) {
        let core = self.core_mut();
        core.refreshing = false;
        if core.panel.visible && !core.initialized {
            core.panel.content = PanelContent::Message(FAILED_TO_LOAD.to_string());
        }
    }

    /// Conceal the panel and drop rendered content. Cached data is kept.
    fn hide(&mut self) {
        let panel = &mut self.core_mut().panel;
        panel.visible = false;
        panel.content = PanelContent::Empty;
    }
}

/// Begin, run and finish a refresh in one await.
pub async fn refresh(widget: &mut dyn Widget, source: &dyn TextSource) {
    if let Some(job) = widget.begin_refresh() {
        let completed = job.run(source).await;
        widget.finish_refresh(completed.outcome);
    }
}

/// The four SPC widgets, in dashboard order.
pub fn widgets_from_config(config: &Config) -> Vec<Box<dyn Widget>> {
    vec![
        Box::new(StaticImage::new(
            STORM_REPORTS_ID,
            "SPC Storm Reports",
            &config.storm_reports_image_url,
            config.date_offset_hours,
        )),
        Box::new(InteractiveMap::new(
            REPORTS_MAP_ID,
            "SPC Reports Map",
            &config.interactive_map_url,
            config.date_offset_hours,
        )),
        Box::new(RssFeed::new(RSS_FEED_ID, "SPC RSS Feed", &config.rss_url)),
        Box::new(CsvTable::new(
            REPORT_TABLES_ID,
            "SPC Storm Reports Table",
            &config.csv_url,
        )),
    ]
}

// ============================================================================
// Test support
// ============================================================================
