use super::Control;
use crate::storage::{ToggleState, ToggleStore};
use crate::widget::{RefreshJob, Widget};

/// Binds one checkbox to one widget.
///
/// Checking persists `On` and shows the widget; unchecking persists `Off`
/// and hides it. The widget itself lives in the dashboard slot next to this
/// controller and is passed in on every transition.
#[derive(Debug, Clone)]
pub struct ToggleController {
    widget_id: String,
    control: Control,
}

impl ToggleController {
    /// Restore the persisted state and drive the matching transition once.
    ///
    /// Runs even when the stored state is absent, so every widget starts from
    /// a rendered show or hide and the record gains an explicit entry.
    pub async fn attach(
        widget: &mut dyn Widget,
        store: &ToggleStore,
    ) -> (Self, Option<RefreshJob>) {
        let state = store.get(widget.id()).await;
        let toggle = Self {
            widget_id: widget.id().to_string(),
            control: Control {
                checked: state.is_on(),
                enabled: true,
            },
        };
        tracing::debug!(widget = %toggle.widget_id, ?state, "Restored toggle state");

        let job = toggle.drive(widget, store).await;
        (toggle, job)
    }

    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn is_checked(&self) -> bool {
        self.control.checked
    }

    /// Move the control to `checked`. A no-op when it is already there.
    pub async fn set_checked(
        &mut self,
        checked: bool,
        widget: &mut dyn Widget,
        store: &ToggleStore,
    ) -> Option<RefreshJob> {
        if self.control.checked == checked {
            return None;
        }
        self.control.checked = checked;
        self.drive(widget, store).await
    }

    /// Persist the current control value and show or hide to match.
    pub async fn drive(&self, widget: &mut dyn Widget, store: &ToggleStore) -> Option<RefreshJob> {
        let state = ToggleState::from_checked(self.control.checked);
        store.set(&self.widget_id, state).await;

        if self.control.checked {
            widget.show()
        } else {
            widget.hide();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::widget::{PanelContent, RssFeed, StaticImage};

    async fn test_store() -> ToggleStore {
        ToggleStore::new(Database::open(":memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_absent_state_hides_and_persists_off() {
        let store = test_store().await;
        let mut widget = RssFeed::new("spc-rss", "SPC RSS Feed", "https://example.com/rss.xml");

        let (toggle, job) = ToggleController::attach(&mut widget, &store).await;
        assert!(job.is_none());
        assert!(!toggle.is_checked());
        assert!(toggle.control().enabled);
        assert!(!widget.panel().visible);
        assert_eq!(store.get("spc-rss").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_persisted_on_shows_at_attach() {
        let store = test_store().await;
        store.set("spc-rss", ToggleState::On).await;
        let mut widget = RssFeed::new("spc-rss", "SPC RSS Feed", "https://example.com/rss.xml");

        let (toggle, job) = ToggleController::attach(&mut widget, &store).await;
        assert!(toggle.is_checked());
        assert_eq!(job.unwrap().url, "https://example.com/rss.xml");
        assert!(widget.panel().visible);
        assert_eq!(widget.panel().content, PanelContent::Loading);
    }

    #[tokio::test]
    async fn test_set_checked_transitions_and_persists() {
        let store = test_store().await;
        let mut widget = StaticImage::new("spc-reports", "Reports", "https://example.com/a.gif", 0);
        let (mut toggle, _) = ToggleController::attach(&mut widget, &store).await;

        toggle.set_checked(true, &mut widget, &store).await;
        assert!(widget.panel().visible);
        assert_eq!(store.get("spc-reports").await, ToggleState::On);

        toggle.set_checked(false, &mut widget, &store).await;
        assert!(!widget.panel().visible);
        assert_eq!(widget.panel().content, PanelContent::Empty);
        assert_eq!(store.get("spc-reports").await, ToggleState::Off);
    }

    #[tokio::test]
    async fn test_set_checked_same_value_is_noop() {
        let store = test_store().await;
        let mut widget = RssFeed::new("spc-rss", "SPC RSS Feed", "https://example.com/rss.xml");
        let (mut toggle, _) = ToggleController::attach(&mut widget, &store).await;

        // Corrupt the record; a no-op must not rewrite it
        store
            .database()
            .set_preference(crate::storage::TOGGLES_KEY, "oops")
            .await
            .unwrap();
        assert!(toggle.set_checked(false, &mut widget, &store).await.is_none());
        assert_eq!(
            store
                .database()
                .get_preference(crate::storage::TOGGLES_KEY)
                .await
                .unwrap()
                .as_deref(),
            Some("oops")
        );
    }
}
