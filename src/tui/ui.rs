// UI rendering logic
//
// Two panes: the server list on the left, and on the right either the
// creation form, the chat view of the focused (session, channel), or the
// log view. Rendering reads state only, apart from scroll dimensions which
// depend on the area being drawn into.

use super::app::App;
use super::form::FormField;
use super::theme::Theme;
use crate::events::SYS_KEY;
use crate::focus::{Mode, Pane};
use crate::rows::ListRow;
use crate::session::SessionRegistry;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

const ADD_SERVER: &str = "+ Add New Server";

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &mut App) {
    let left_width = app.left_pane_width.min(f.area().width / 2);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(left_width), Constraint::Min(0)])
        .split(f.area());

    render_server_list(f, chunks[0], app);

    if app.show_logs {
        render_logs(f, chunks[1], app);
        return;
    }
    match app.context.focus.mode() {
        Mode::Form => render_form(f, chunks[1], app),
        Mode::Chat => render_chat(f, chunks[1], app),
    }
}

/// Truncate to `width` display columns, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            // Make room for the ellipsis
            while used + 1 > width {
                match out.pop() {
                    Some(last) => used -= last.width().unwrap_or(0),
                    None => return out,
                }
            }
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Text of one server list row
pub fn row_label(registry: &SessionRegistry, row: &ListRow) -> String {
    match row {
        ListRow::AddPlaceholder => ADD_SERVER.to_string(),
        ListRow::Session { session, channel } => {
            let Some(session) = registry.get(*session) else {
                return String::new();
            };
            let marker = if session.is_connected() { '●' } else { '○' };
            match channel {
                None => format!("{} {} {}", marker, session.name, session.address),
                Some(channel) => format!("{}   {} · {}", marker, session.name, channel),
            }
        }
    }
}

fn render_server_list(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.context.focus.pane() == Pane::ServerList;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border(focused))
        .title(Span::styled(" servers ", theme.title()))
        .title_bottom(Line::from(" a:add d:del F2:logs ").centered());
    let width = block.inner(area).width as usize;

    let items: Vec<ListItem> = app
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let label = truncate(&row_label(&app.context.registry, row), width);
            let mut style = if i == app.selected_row && focused {
                theme.selected()
            } else if i == app.selected_row {
                Style::default().fg(theme.accent)
            } else if *row == ListRow::AddPlaceholder {
                Style::default().fg(theme.dim)
            } else {
                Style::default().fg(row_color(theme, &app.context.registry, row))
            };
            if is_viewed(app, row) {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(Span::styled(label, style)))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

/// The row whose log the chat view is showing
fn is_viewed(app: &App, row: &ListRow) -> bool {
    match row {
        ListRow::Session { session, channel } => app
            .context
            .focus
            .is_viewing(*session, channel.as_deref().unwrap_or(SYS_KEY)),
        ListRow::AddPlaceholder => false,
    }
}

fn row_color(theme: &Theme, registry: &SessionRegistry, row: &ListRow) -> ratatui::style::Color {
    let connected = row
        .session()
        .and_then(|id| registry.get(id))
        .is_some_and(|s| s.is_connected());
    if connected {
        theme.connected
    } else {
        theme.disconnected
    }
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.context.focus.pane() == Pane::RightPane;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border(focused))
        .title(Span::styled(" add server ", theme.title()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    const LABEL_WIDTH: u16 = 11;
    let mut lines = Vec::new();
    let mut cursor = None;

    for (row, field) in FormField::ALL.iter().enumerate() {
        let selected = *field == app.form.selected();
        let marker = if selected { "› " } else { "  " };

        let line = match app.form.input(*field) {
            Some(input) => {
                if selected {
                    cursor = Some((
                        inner.x + LABEL_WIDTH + input.cursor_column(),
                        inner.y + (row as u16) * 2,
                    ));
                }
                let value = if input.is_empty() {
                    Span::styled(field.placeholder(), Style::default().fg(theme.dim))
                } else {
                    Span::raw(input.text().to_string())
                };
                Line::from(vec![
                    Span::styled(
                        format!("{}{:<9}", marker, field.label()),
                        Style::default().fg(theme.accent),
                    ),
                    value,
                ])
            }
            None => {
                let style = if selected {
                    theme.selected().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.accent)
                };
                Line::from(vec![Span::raw(marker), Span::styled("[ Submit ]", style)])
            }
        };
        lines.push(line);
        lines.push(Line::default());
    }

    if let Some(error) = &app.form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
    }

    f.render_widget(Paragraph::new(lines), inner);

    if let Some((x, y)) = cursor.filter(|_| focused) {
        if x < inner.right() && y < inner.bottom() {
            f.set_cursor_position((x, y));
        }
    }
}

fn chat_title(app: &App) -> String {
    let Some(id) = app.context.focus.session() else {
        return String::new();
    };
    let Some(session) = app.context.registry.get(id) else {
        return String::new();
    };
    let channel = match app.context.focus.channel() {
        SYS_KEY => "(system)",
        channel => channel,
    };
    if session.is_connected() {
        format!(" ● {} ({}) {} ", session.name, session.nick, channel)
    } else {
        format!(
            " ○ {} ({}) {} [{}] ",
            session.name,
            session.nick,
            channel,
            session.state().as_str()
        )
    }
}

fn render_chat(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.context.focus.pane() == Pane::RightPane;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border(focused))
        .title(Span::styled(chat_title(app), app.theme.title()));
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    let width = (inner.width as usize).max(1);
    let mut lines: Vec<Line> = Vec::new();
    for stored in app.context.active_lines() {
        let style = app.theme.line(stored.kind);
        for part in stored.text.split('\n') {
            if part.is_empty() {
                lines.push(Line::default());
                continue;
            }
            for wrapped in textwrap::wrap(part, width) {
                lines.push(Line::from(Span::styled(wrapped.into_owned(), style)));
            }
        }
    }

    app.chat_scroll
        .update_dimensions(lines.len(), inner.height as usize);
    let (start, end) = app.chat_scroll.visible_range();
    let visible: Vec<Line> = lines.drain(start..end).collect();
    f.render_widget(Paragraph::new(visible), inner);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border(focused));
    let input_area = input_block.inner(chunks[1]);
    f.render_widget(input_block, chunks[1]);

    let prompt = Line::from(vec![
        Span::styled("> ", Style::default().fg(app.theme.accent)),
        Span::raw(app.chat_input.text().to_string()),
    ]);
    f.render_widget(Paragraph::new(prompt), input_area);

    if focused {
        let x = input_area.x + 2 + app.chat_input.cursor_column();
        if x < input_area.right() {
            f.set_cursor_position((x, input_area.y));
        }
    }
}

fn render_logs(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border(true))
        .title(Span::styled(" logs ", app.theme.title()))
        .title_bottom(Line::from(" F2:close ").centered());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let entries = app.log_buffer.recent(usize::MAX);
    let width = inner.width as usize;
    let lines: Vec<Line> = entries
        .iter()
        .map(|entry| {
            Line::from(Span::styled(
                truncate(&entry.render(), width),
                app.theme.log_level(entry.level),
            ))
        })
        .collect();

    app.log_scroll
        .update_dimensions(lines.len(), inner.height as usize);
    let (start, end) = app.log_scroll.visible_range();
    f.render_widget(Paragraph::new(lines[start..end].to_vec()), inner);
}
