//! Widget panel rendering.
//!
//! Visible panels are stacked top to bottom in dashboard order. Each
//! [`PanelContent`] variant has its own renderer; feed and report text is
//! sanitized before it reaches the terminal.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use stormwatch::feed::FeedItem;
use stormwatch::util::{display_width, sanitize_for_terminal, strip_markup};
use stormwatch::widget::{PanelContent, TitledTable};

use crate::app::{App, Focus};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_panels();
    if visible.is_empty() {
        let hint = Paragraph::new("No widgets shown. Select one on the left and press Space.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Dashboard"));
        f.render_widget(hint, area);
        return;
    }

    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(visible.iter().map(|_| Constraint::Fill(1)))
        .split(area);

    for (position, (&slot, &panel_area)) in visible.iter().zip(areas.iter()).enumerate() {
        let Some(widget) = app.dashboard.widget(slot) else {
            continue;
        };
        let focused = app.focus == Focus::Panels && position == app.focused_panel;
        let panel = widget.panel();

        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(panel.heading.as_str());

        match &panel.content {
            PanelContent::Feed(items) => render_feed(f, app, items, focused, block, panel_area),
            PanelContent::Tables(tables) => {
                let scroll = if focused { app.panel_cursor } else { 0 };
                let paragraph = Paragraph::new(tables_text(tables))
                    .block(block)
                    .scroll((scroll.min(u16::MAX as usize) as u16, 0));
                f.render_widget(paragraph, panel_area);
            }
            other => {
                let paragraph = Paragraph::new(simple_text(other))
                    .block(block)
                    .wrap(Wrap { trim: false });
                f.render_widget(paragraph, panel_area);
            }
        }
    }
}

fn simple_text(content: &PanelContent) -> Text<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    match content {
        PanelContent::Empty => Text::default(),
        PanelContent::Loading => Text::styled("Loading...", dim),
        PanelContent::Image { url } => Text::from(vec![
            Line::from("Storm report image"),
            Line::from(Span::styled(url.clone(), Style::default().fg(Color::Blue))),
            Line::from(Span::styled("[o] open in browser", dim)),
        ]),
        PanelContent::Frame { url } => Text::from(vec![
            Line::from("Interactive report map"),
            Line::from(Span::styled(url.clone(), Style::default().fg(Color::Blue))),
            Line::from(Span::styled("[o] open in browser", dim)),
        ]),
        PanelContent::Message(msg) => Text::styled(msg.clone(), Style::default().fg(Color::Red)),
        // Handled by dedicated renderers
        PanelContent::Feed(_) | PanelContent::Tables(_) => Text::default(),
    }
}

fn render_feed(f: &mut Frame, app: &App, items: &[FeedItem], focused: bool, block: Block, area: Rect) {
    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let title = sanitize_for_terminal(&item.title);
            let mut lines = vec![
                Line::from(vec![
                    Span::raw(format!("{} ", item.icon().glyph())),
                    Span::styled(title.into_owned(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("   {}", item.display_date()),
                    Style::default().fg(Color::DarkGray),
                )),
            ];

            if app.expanded.contains(&item.id()) {
                let details = strip_markup(&item.description);
                let details = sanitize_for_terminal(&details);
                if details.trim().is_empty() {
                    lines.push(Line::from("   (no details)"));
                }
                for line in details.lines() {
                    lines.push(Line::from(format!("   {}", line)));
                }
            } else if !item.description.is_empty() {
                lines.push(Line::from(Span::styled(
                    "   ▸ Show Details",
                    Style::default().fg(Color::DarkGray),
                )));
            }

            ListItem::new(Text::from(lines))
        })
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.panel_cursor.min(items.len().saturating_sub(1))));
    }

    let list = List::new(list_items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_stateful_widget(list, area, &mut state);
}

/// Tornado, Wind and Hail tables with columns padded to display width.
fn tables_text(tables: &[TitledTable]) -> Text<'static> {
    let mut lines = Vec::new();

    for titled in tables {
        lines.push(Line::from(Span::styled(
            titled.title.clone(),
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));

        let header: Vec<String> = titled
            .table
            .header
            .iter()
            .map(|cell| sanitize_for_terminal(cell).into_owned())
            .collect();
        let rows: Vec<Vec<String>> = titled
            .table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| sanitize_for_terminal(cell).into_owned())
                    .collect()
            })
            .collect();

        let widths = column_widths(&header, &rows);
        lines.push(Line::from(Span::styled(
            format_row(&header, &widths),
            Style::default().fg(Color::Cyan),
        )));
        lines.extend(rows.iter().map(|row| Line::from(format_row(row, &widths))));
        lines.push(Line::default());
    }

    Text::from(lines)
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|cell| display_width(cell)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let width = display_width(cell);
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(width),
                None => widths.push(width),
            }
        }
    }
    widths
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        // Last cell is not padded
        if i + 1 < cells.len() {
            let width = widths.get(i).copied().unwrap_or(0);
            out.extend(std::iter::repeat(' ').take(width.saturating_sub(display_width(cell))));
        }
    }
    out
}
