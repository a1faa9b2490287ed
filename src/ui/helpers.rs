//! Helper functions for UI operations.
//!
//! Background refresh spawning and panic capture for spawned tasks.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

use stormwatch::feed::TextSource;
use stormwatch::widget::RefreshJob;

use crate::app::AppEvent;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of the task silently disappearing (caught by Tokio's runtime but
/// not handled), panics are converted to `Err(String)` containing the panic
/// message.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run a widget refresh in the background and report it as an [`AppEvent`].
///
/// The dashboard stays on the UI task; only the job and a handle to the
/// source move into the spawned task.
pub(super) fn spawn_refresh(
    job: RefreshJob,
    source: &Arc<dyn TextSource>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let source = Arc::clone(source);
    let tx = event_tx.clone();
    let widget = job.widget_id.clone();

    tracing::debug!(widget = %widget, url = %job.url, "Spawning widget refresh");

    tokio::spawn(async move {
        let event = match catch_task_panic(job.run(source.as_ref())).await {
            Ok(completed) => AppEvent::WidgetRefreshed(completed),
            Err(panic_msg) => {
                tracing::error!(task = "refresh", widget = %widget, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task: "refresh",
                    widget,
                    error: panic_msg,
                }
            }
        };

        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, event = "WidgetRefreshed", "Channel send failed (receiver dropped)");
        }
    });
}

pub(super) fn spawn_all(
    jobs: impl IntoIterator<Item = RefreshJob>,
    source: &Arc<dyn TextSource>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    for job in jobs {
        spawn_refresh(job, source, event_tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        let result = catch_task_panic(async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_catch_task_panic_str_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_formatted_message() {
        let widget = "spc-rss";
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("failed on {}", widget) }).await;
        assert_eq!(result, Err("failed on spc-rss".to_string()));
    }
}
