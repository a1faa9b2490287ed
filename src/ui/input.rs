//! Keyboard input handling.

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use stormwatch::util::validate_url_for_open;
use stormwatch::widget::PanelContent;

use super::helpers::{spawn_all, spawn_refresh};
use super::Action;
use crate::app::{App, AppEvent, ControlRow, Focus};

pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Tab | KeyCode::BackTab => app.switch_focus(),
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::Char('l') | KeyCode::Right if app.focus == Focus::Panels => app.cycle_panel(1),
        KeyCode::Char('h') | KeyCode::Left if app.focus == Focus::Panels => app.cycle_panel(-1),
        KeyCode::Char(' ') if app.focus == Focus::Controls => toggle_selected(app, event_tx).await,
        KeyCode::Enter => match app.focus {
            Focus::Controls => toggle_selected(app, event_tx).await,
            Focus::Panels => expand_selected_item(app),
        },
        KeyCode::Char('o') => open_target(app),
        KeyCode::Char('r') => refresh_target(app, event_tx),
        KeyCode::Char('R') => refresh_visible(app, event_tx),
        _ => {}
    }

    Action::Continue
}

/// Flip the checkbox under the cursor and spawn any refresh it triggers.
async fn toggle_selected(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let jobs = match app.selected_row() {
        Some(ControlRow::Group(group)) => {
            let Some(controller) = app.dashboard.groups().get(group) else {
                return;
            };
            if !controller.is_enabled() {
                let msg = format!("{} has no widgets", controller.name());
                app.set_status(msg);
                return;
            }
            app.dashboard.toggle_group(group).await
        }
        Some(ControlRow::Widget(slot)) => app.dashboard.toggle_widget(slot).await.into_iter().collect(),
        None => return,
    };

    spawn_all(jobs, &app.source, event_tx);
    app.clamp_selections();
}

fn expand_selected_item(app: &mut App) {
    let item_id = app
        .focused_slot()
        .and_then(|slot| app.dashboard.widget(slot))
        .and_then(|widget| match &widget.panel().content {
            PanelContent::Feed(items) => items.get(app.panel_cursor).map(|item| item.id()),
            _ => None,
        });

    if let Some(id) = item_id {
        app.toggle_expanded(id);
    }
}

/// Link for the `o` key: the selected feed item, or the image or map shown.
fn link_target(app: &App) -> Option<String> {
    let widget = app.dashboard.widget(app.target_slot()?)?;
    match &widget.panel().content {
        PanelContent::Feed(items) => items.get(app.panel_cursor).map(|item| item.link.clone()),
        PanelContent::Image { url } | PanelContent::Frame { url } => Some(url.clone()),
        _ => None,
    }
}

fn open_target(app: &mut App) {
    let Some(url) = link_target(app) else {
        app.set_status("Nothing to open");
        return;
    };

    // SEC: Validate URL before open::that() to prevent command injection
    match validate_url_for_open(&url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(valid) => match open::that(valid.as_str()) {
            Ok(()) => app.set_status("Opening in browser..."),
            Err(e) => app.set_status(format!("Failed to open browser: {}", e)),
        },
    }
}

fn refresh_target(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(slot) = app.target_slot() else {
        app.set_status("Select a widget to refresh");
        return;
    };
    if let Some(job) = app.dashboard.refresh_widget(slot) {
        spawn_refresh(job, &app.source, event_tx);
        app.set_status("Refreshing...");
    }
}

fn refresh_visible(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let jobs: Vec<_> = app
        .visible_panels()
        .into_iter()
        .filter_map(|slot| app.dashboard.refresh_widget(slot))
        .collect();
    if !jobs.is_empty() {
        app.set_status(format!("Refreshing {} widgets...", jobs.len()));
    }
    spawn_all(jobs, &app.source, event_tx);
}
