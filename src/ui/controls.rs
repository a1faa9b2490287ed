use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::{App, ControlRow, Focus};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn checkbox(checked: bool, enabled: bool) -> &'static str {
    match (enabled, checked) {
        (false, _) => "[-]",
        (true, true) => "[x]",
        (true, false) => "[ ]",
    }
}

/// Render the group and widget checkboxes
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Controls;

    let items: Vec<ListItem> = app
        .control_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut style = if is_focused && i == app.selected_control {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };

            let mut spans = Vec::with_capacity(3);
            match row {
                ControlRow::Group(g) => {
                    let group = &app.dashboard.groups()[g];
                    let control = group.control();
                    if !control.enabled {
                        style = style.fg(Color::DarkGray);
                    } else {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    spans.push(Span::styled(
                        format!("{} {}", checkbox(control.checked, control.enabled), group.label()),
                        style,
                    ));
                }
                ControlRow::Widget(slot) => {
                    let entry = &app.dashboard.slots()[slot];
                    spans.push(Span::styled(
                        format!(
                            "  {} {}",
                            checkbox(entry.toggle.is_checked(), true),
                            entry.widget.panel().heading
                        ),
                        style,
                    ));
                    if entry.widget.is_refreshing() {
                        spans.push(Span::styled(
                            format!(" {}", SPINNER[app.spinner_frame % SPINNER.len()]),
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                }
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Widgets"),
    );

    f.render_widget(list, area);
}
