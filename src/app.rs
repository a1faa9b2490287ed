use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;

use stormwatch::dashboard::Dashboard;
use stormwatch::feed::TextSource;
use stormwatch::widget::{CompletedRefresh, PanelContent};

// ============================================================================
// Focus & Control Rows
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Left column of group and widget checkboxes
    Controls,
    /// Right column of visible widget panels
    Panels,
}

/// One line of the control column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRow {
    Group(usize),
    Widget(usize),
}

// ============================================================================
// App Events
// ============================================================================

/// Results sent back to the UI loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// A widget refresh job finished, successfully or not
    WidgetRefreshed(CompletedRefresh),
    /// A background task panicked before it could report
    TaskPanicked {
        task: &'static str,
        widget: String,
        error: String,
    },
}

// ============================================================================
// App State
// ============================================================================

pub struct App {
    pub dashboard: Dashboard,
    pub source: Arc<dyn TextSource>,
    pub focus: Focus,
    /// Index into [`App::control_rows`]
    pub selected_control: usize,
    /// Index into [`App::visible_panels`]
    pub focused_panel: usize,
    /// Selected feed item, or first table line, within the focused panel
    pub panel_cursor: usize,
    /// Feed item ids whose details are expanded
    pub expanded: HashSet<String>,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(dashboard: Dashboard, source: Arc<dyn TextSource>) -> Self {
        Self {
            dashboard,
            source,
            focus: Focus::Controls,
            selected_control: 0,
            focused_panel: 0,
            panel_cursor: 0,
            expanded: HashSet::new(),
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    /// Groups first, then widgets, in dashboard order.
    pub fn control_rows(&self) -> Vec<ControlRow> {
        (0..self.dashboard.groups().len())
            .map(ControlRow::Group)
            .chain((0..self.dashboard.slots().len()).map(ControlRow::Widget))
            .collect()
    }

    pub fn selected_row(&self) -> Option<ControlRow> {
        self.control_rows().get(self.selected_control).copied()
    }

    /// Slot indices of widgets whose panel is shown.
    pub fn visible_panels(&self) -> Vec<usize> {
        self.dashboard
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.widget.panel().visible)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn focused_slot(&self) -> Option<usize> {
        self.visible_panels().get(self.focused_panel).copied()
    }

    /// The widget the user is pointing at: the focused panel, or the selected
    /// widget row in the control column.
    pub fn target_slot(&self) -> Option<usize> {
        match self.focus {
            Focus::Panels => self.focused_slot(),
            Focus::Controls => match self.selected_row()? {
                ControlRow::Widget(slot) => Some(slot),
                ControlRow::Group(_) => None,
            },
        }
    }

    /// Number of cursor positions in the focused panel.
    fn panel_len(&self) -> usize {
        let Some(widget) = self.focused_slot().and_then(|s| self.dashboard.widget(s)) else {
            return 0;
        };
        match &widget.panel().content {
            PanelContent::Feed(items) => items.len(),
            PanelContent::Tables(tables) => tables.iter().map(|t| t.table.rows.len() + 3).sum(),
            _ => 0,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::Controls => {
                let len = self.control_rows().len();
                self.selected_control = step(self.selected_control, delta, len);
            }
            Focus::Panels => {
                let len = self.panel_len();
                self.panel_cursor = step(self.panel_cursor, delta, len);
            }
        }
    }

    /// Cycle between visible panels (Panels focus only).
    pub fn cycle_panel(&mut self, delta: isize) {
        let count = self.visible_panels().len();
        if count == 0 {
            return;
        }
        let next = (self.focused_panel as isize + delta).rem_euclid(count as isize);
        self.focused_panel = next as usize;
        self.panel_cursor = 0;
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Controls if !self.visible_panels().is_empty() => Focus::Panels,
            Focus::Controls => {
                self.set_status("No panels shown");
                Focus::Controls
            }
            Focus::Panels => Focus::Controls,
        };
        self.panel_cursor = 0;
    }

    /// Keep indices valid after panels appear, disappear or reload.
    pub fn clamp_selections(&mut self) {
        let rows = self.control_rows().len();
        self.selected_control = self.selected_control.min(rows.saturating_sub(1));

        let panels = self.visible_panels().len();
        if panels == 0 {
            self.focused_panel = 0;
            self.focus = Focus::Controls;
        } else {
            self.focused_panel = self.focused_panel.min(panels - 1);
        }
        self.panel_cursor = self.panel_cursor.min(self.panel_len().saturating_sub(1));
    }

    pub fn toggle_expanded(&mut self, item_id: String) {
        if !self.expanded.remove(&item_id) {
            self.expanded.insert(item_id);
        }
    }

    pub fn any_refreshing(&self) -> bool {
        self.dashboard
            .slots()
            .iter()
            .any(|slot| slot.widget.is_refreshing())
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::time::Duration;
    use stormwatch::config::GroupSpec;
    use stormwatch::dashboard::DashboardBuilder;
    use stormwatch::feed::FetchError;
    use stormwatch::storage::{Database, ToggleStore};
    use stormwatch::widget::{InteractiveMap, RssFeed, StaticImage};
    use tokio::time;

    pub(crate) const RSS_URL: &str = "https://example.com/spcrss.xml";

    /// Serves one RSS document for [`RSS_URL`], 404 elsewhere.
    pub(crate) struct OneFeed;

    impl TextSource for OneFeed {
        fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
            let result = if url == RSS_URL {
                Ok(r#"<rss><channel>
<item><title>SPC Tornado Watch 412</title><link>https://www.spc.noaa.gov/products/watch/ww0412.html</link><pubDate>Fri, 07 Jun 2024 18:45:00 +0000</pubDate><description>&lt;p&gt;Watch text&lt;/p&gt;</description></item>
<item><title>Day 1 Convective Outlook</title><pubDate>Fri, 07 Jun 2024 12:57:00 +0000</pubDate></item>
</channel></rss>"#
                    .to_string())
            } else {
                Err(FetchError::HttpStatus(404))
            };
            async move { result }.boxed()
        }
    }

    pub(crate) async fn test_app() -> App {
        let store = ToggleStore::new(Database::open(":memory:").await.unwrap());
        let (dashboard, _) = DashboardBuilder::new()
            .widget(StaticImage::new("img", "Image", "https://example.com/a.gif", 0))
            .widget(InteractiveMap::new("map", "Map", "https://example.com/map", 0))
            .widget(RssFeed::new("rss", "RSS", RSS_URL))
            .group(GroupSpec {
                id: "all".to_string(),
                name: "All".to_string(),
                members: vec!["img".to_string(), "map".to_string(), "rss".to_string()],
            })
            .build(store)
            .await;
        App::new(dashboard, Arc::new(OneFeed))
    }

    #[tokio::test]
    async fn test_control_rows_groups_then_widgets() {
        let app = test_app().await;
        assert_eq!(
            app.control_rows(),
            vec![
                ControlRow::Group(0),
                ControlRow::Widget(0),
                ControlRow::Widget(1),
                ControlRow::Widget(2),
            ]
        );
        assert_eq!(app.selected_row(), Some(ControlRow::Group(0)));
        assert_eq!(app.target_slot(), None);
    }

    #[tokio::test]
    async fn test_move_selection_clamps() {
        let mut app = test_app().await;
        app.move_selection(-1);
        assert_eq!(app.selected_control, 0);
        app.move_selection(10);
        assert_eq!(app.selected_control, 3);
        assert_eq!(app.target_slot(), Some(2));
    }

    #[tokio::test]
    async fn test_switch_focus_requires_visible_panel() {
        let mut app = test_app().await;
        app.switch_focus();
        assert_eq!(app.focus, Focus::Controls);
        assert!(app.status_message.is_some());

        app.dashboard.set_widget(1, true).await;
        app.switch_focus();
        assert_eq!(app.focus, Focus::Panels);
        assert_eq!(app.focused_slot(), Some(1));
    }

    #[tokio::test]
    async fn test_clamp_after_panels_hidden() {
        let mut app = test_app().await;
        app.dashboard.set_widget(0, true).await;
        app.dashboard.set_widget(1, true).await;
        app.switch_focus();
        app.cycle_panel(1);
        assert_eq!(app.focused_slot(), Some(1));

        app.dashboard.set_widget(1, false).await;
        app.clamp_selections();
        assert_eq!(app.focused_slot(), Some(0));

        app.dashboard.set_widget(0, false).await;
        app.clamp_selections();
        assert_eq!(app.focus, Focus::Controls);
    }

    #[tokio::test]
    async fn test_toggle_expanded() {
        let mut app = test_app().await;
        app.toggle_expanded("a-240607".to_string());
        assert!(app.expanded.contains("a-240607"));
        app.toggle_expanded("a-240607".to_string());
        assert!(app.expanded.is_empty());
    }

    #[tokio::test]
    async fn test_status_message_expires_after_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
