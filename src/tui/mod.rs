// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, resizes, domain events from the bridge)
// - Rendering the UI
//
// The loop is the single consumer of the bridge: every DomainEvent is
// applied here, on this task, between two frames.

pub mod app;
pub mod form;
pub mod input;
pub mod scroll;
pub mod theme;
pub mod ui;

use crate::bridge::EventReceiver;
use crate::context::AppContext;
use crate::focus::{Mode, Pane};
use crate::logging::LogBuffer;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Redraw cadence while the log view is open (records arrive outside the loop)
const LOG_REFRESH: Duration = Duration::from_millis(250);

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// when done. Returns the context so the caller can shut sessions down.
pub async fn run_tui(
    context: AppContext,
    events: EventReceiver,
    log_buffer: LogBuffer,
    left_pane_width: u16,
) -> Result<AppContext> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(context, log_buffer, left_pane_width);

    let result = run_event_loop(&mut terminal, &mut app, events).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result.map(|()| app.context)
}

/// Main event loop
///
/// Waits on terminal input and the bridge at the same time. Bursts from the
/// bridge are drained before the next frame so a busy server doesn't cost
/// one redraw per line.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: EventReceiver,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut log_refresh = tokio::time::interval(LOG_REFRESH);

    // Crossterm only reports changes, so the size we start with stands in
    // for the first resize notification.
    let size = terminal.size().context("Failed to read terminal size")?;
    app.on_resize(size.width, size.height);

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            biased;

            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    handle_key_event(app, key);
                }
                Some(Ok(Event::Resize(width, height))) => app.on_resize(width, height),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => break,
            },

            Some(event) = events.recv() => {
                app.context.handle_event(event);
                while let Some(event) = events.try_recv() {
                    app.context.handle_event(event);
                }
            }

            _ = log_refresh.tick(), if app.show_logs => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle keyboard input
/// Layered dispatch: Global → Pane → Right pane mode
fn handle_key_event(app: &mut App, key: KeyEvent) {
    if handle_global_keys(app, &key) {
        return;
    }

    match app.context.focus.pane() {
        Pane::ServerList => handle_server_list_keys(app, &key),
        Pane::RightPane if app.show_logs => handle_log_keys(app, &key),
        Pane::RightPane => match app.context.focus.mode() {
            Mode::Form => handle_form_keys(app, &key),
            Mode::Chat => handle_chat_keys(app, &key),
        },
    }
}

/// Keys that work regardless of pane. Returns true if handled.
fn handle_global_keys(app: &mut App, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Esc => app.should_quit = true,
        KeyCode::F(2) => app.toggle_logs(),
        // While typing, arrows move the cursor instead of switching panes
        KeyCode::Left | KeyCode::Right if editing_chat(app) => return false,
        KeyCode::Left => app.context.focus.focus_servers(),
        KeyCode::Right => app.context.focus.focus_right(),
        KeyCode::Tab => match app.context.focus.pane() {
            Pane::ServerList => app.context.focus.focus_right(),
            Pane::RightPane => app.context.focus.focus_servers(),
        },
        _ => return false,
    }
    true
}

fn editing_chat(app: &App) -> bool {
    app.context.focus.pane() == Pane::RightPane
        && app.context.focus.mode() == Mode::Chat
        && !app.show_logs
        && !app.chat_input.is_empty()
}

fn handle_server_list_keys(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => {
            app.show_logs = false;
            app.activate_selected();
        }
        KeyCode::Char('a') => {
            app.show_logs = false;
            app.open_form();
        }
        KeyCode::Char('d') => app.delete_selected(),
        _ => {}
    }
}

fn handle_form_keys(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Up => app.form.select_prev(),
        KeyCode::Down => app.form.select_next(),
        KeyCode::Enter => app.form_enter(),
        KeyCode::Backspace => app.form.delete_back(),
        KeyCode::Char(c) => app.form.insert_char(c),
        _ => {}
    }
}

fn handle_chat_keys(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Up => app.chat_scroll.scroll_up(1),
        KeyCode::Down => app.chat_scroll.scroll_down(1),
        KeyCode::PageUp => app.chat_scroll.half_page_up(),
        KeyCode::PageDown => app.chat_scroll.half_page_down(),
        KeyCode::Enter => app.submit_chat(),
        KeyCode::Backspace => app.chat_input.delete_back(),
        KeyCode::Delete => app.chat_input.delete_forward(),
        KeyCode::Left => app.chat_input.move_left(),
        KeyCode::Right => app.chat_input.move_right(),
        KeyCode::Home => app.chat_input.move_home(),
        KeyCode::End => app.chat_input.move_end(),
        KeyCode::Char(c) => app.chat_input.insert_char(c),
        _ => {}
    }
}

fn handle_log_keys(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Up => app.log_scroll.scroll_up(1),
        KeyCode::Down => app.log_scroll.scroll_down(1),
        KeyCode::PageUp => app.log_scroll.half_page_up(),
        KeyCode::PageDown => app.log_scroll.half_page_down(),
        _ => {}
    }
}
