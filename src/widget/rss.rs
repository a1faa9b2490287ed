use super::{
    PanelContent, RefreshJob, RefreshKind, RefreshOutcome, Widget, WidgetCore, FAILED_TO_LOAD,
};
use crate::feed::FeedItem;

/// The SPC RSS feed, newest items first.
pub struct RssFeed {
    core: WidgetCore,
    url: String,
    items: Vec<FeedItem>,
}

impl RssFeed {
    pub fn new(id: impl Into<String>, heading: impl Into<String>, url: &str) -> Self {
        Self {
            core: WidgetCore::new(id, heading),
            url: url.to_string(),
            items: Vec::new(),
        }
    }

    /// Cached items from the last successful refresh.
    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }
}

impl Widget for RssFeed {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn begin_refresh(&mut self) -> Option<RefreshJob> {
        self.core.start_job(&self.url, RefreshKind::Feed)
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> bool {
        match outcome {
            RefreshOutcome::Feed(Ok(items)) => {
                tracing::info!(widget = %self.core.id, count = items.len(), "Feed refreshed");
                self.items = items;
                true
            }
            RefreshOutcome::Feed(Err(e)) => {
                tracing::warn!(widget = %self.core.id, url = %self.url, error = %e, "Feed refresh failed");
                self.items.clear();
                false
            }
            other => {
                tracing::warn!(widget = %self.core.id, outcome = ?other, "Unexpected refresh outcome for feed widget");
                self.items.clear();
                false
            }
        }
    }

    fn populate(&mut self) {
        self.core.panel.content = if self.items.is_empty() {
            PanelContent::Message(FAILED_TO_LOAD.to_string())
        } else {
            PanelContent::Feed(self.items.clone())
        };
    }
}
