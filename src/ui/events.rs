//! Application event handling.
//!
//! Applies background refresh results to the dashboard.

use stormwatch::widget::RefreshOutcome;

use crate::app::{App, AppEvent};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::WidgetRefreshed(completed) => {
            let failure = match &completed.outcome {
                RefreshOutcome::Feed(Err(e)) | RefreshOutcome::Report(Err(e)) => {
                    Some(e.to_string())
                }
                _ => None,
            };
            let widget_id = completed.widget_id.clone();

            if app.dashboard.complete_refresh(completed) {
                if let Some(error) = failure {
                    let heading = app
                        .dashboard
                        .slot_index(&widget_id)
                        .and_then(|slot| app.dashboard.widget(slot))
                        .map(|w| w.panel().heading.clone())
                        .unwrap_or(widget_id);
                    app.set_status(format!("{}: {}", heading, error));
                }
            }
            app.clamp_selections();
        }
        AppEvent::TaskPanicked {
            task,
            widget,
            error,
        } => {
            tracing::error!(task, widget = %widget, error = %error, "Background task panicked");
            app.dashboard.abandon_refresh(&widget);
            app.set_status(format!("Internal error in {} task: {}", task, error));
        }
    }
}
