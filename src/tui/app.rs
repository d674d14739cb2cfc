// TUI application state
//
// Wraps the AppContext with the purely visual state: list selection, the
// form and chat inputs, scroll positions and the log view toggle. Key
// dispatch lives in mod.rs; everything here is a plain state mutation so it
// can be driven from tests.

use super::form::{FormAction, FormState};
use super::input::TextInput;
use super::scroll::ScrollState;
use super::theme::Theme;
use crate::context::AppContext;
use crate::events::SYS_KEY;
use crate::logging::LogBuffer;
use crate::rows::ListRow;

/// Main application state for the TUI
pub struct App {
    /// Registry, logs, focus and connection plumbing
    pub context: AppContext,

    /// Session creation form
    pub form: FormState,

    /// Chat prompt
    pub chat_input: TextInput,

    /// Index into the server list rows
    pub selected_row: usize,

    pub chat_scroll: ScrollState,
    pub log_scroll: ScrollState,

    /// Captured tracing records for the log view
    pub log_buffer: LogBuffer,

    /// Right pane shows the log view instead of form/chat
    pub show_logs: bool,

    pub should_quit: bool,

    pub left_pane_width: u16,

    pub theme: Theme,

    /// Last known terminal size; `None` until the first resize
    pub size: Option<(u16, u16)>,
}

impl App {
    pub fn new(context: AppContext, log_buffer: LogBuffer, left_pane_width: u16) -> Self {
        Self {
            context,
            form: FormState::new(),
            chat_input: TextInput::new(),
            selected_row: 0,
            chat_scroll: ScrollState::new(),
            log_scroll: ScrollState::new(),
            log_buffer,
            show_logs: false,
            should_quit: false,
            left_pane_width,
            theme: Theme::default(),
            size: None,
        }
    }

    /// Terminal was (re)sized; the first call makes the log store live
    pub fn on_resize(&mut self, width: u16, height: u16) {
        if self.size.is_none() {
            tracing::debug!(width, height, "first terminal size");
        }
        self.size = Some((width, height));
        self.context.mark_ready();
    }

    pub fn rows(&self) -> Vec<ListRow> {
        self.context.rows()
    }

    pub fn selected(&self) -> Option<ListRow> {
        self.rows().get(self.selected_row).cloned()
    }

    pub fn select_prev(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.selected_row = (self.selected_row + 1).min(last);
    }

    /// Keep the selection on a row after the list shrinks
    pub fn clamp_selection(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.selected_row = self.selected_row.min(last);
    }

    /// Point the list selection at whatever the right pane shows
    fn select_focused_row(&mut self) {
        let Some(session) = self.context.focus.session() else {
            return;
        };
        let channel = self.context.focus.channel();
        let focused = self.rows().iter().position(|row| match row {
            ListRow::Session {
                session: s,
                channel: c,
            } => *s == session && c.as_deref().unwrap_or(SYS_KEY) == channel,
            ListRow::AddPlaceholder => false,
        });
        if let Some(index) = focused {
            self.selected_row = index;
        }
    }

    /// Enter on the server list
    pub fn activate_selected(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        if row == ListRow::AddPlaceholder {
            self.open_form();
            return;
        }
        self.context.select_row(&row);
        self.chat_scroll.scroll_to_bottom();
    }

    pub fn open_form(&mut self) {
        self.form.reset();
        self.context.focus.open_form();
    }

    pub fn delete_selected(&mut self) {
        if let Some(row) = self.selected() {
            self.context.delete_row(&row);
            self.clamp_selection();
        }
    }

    /// Enter on the form
    pub fn form_enter(&mut self) {
        let FormAction::Submit(values) = self.form.enter() else {
            return;
        };
        match self.context.submit_form(&values) {
            Ok(_) => {
                self.form.reset();
                self.chat_scroll.scroll_to_bottom();
                self.select_focused_row();
            }
            Err(e) => {
                self.form.error = Some(format!("error: {}", e));
            }
        }
    }

    /// Enter on the chat prompt
    pub fn submit_chat(&mut self) {
        let text = self.chat_input.take();
        self.context.submit_chat(&text);
        self.chat_scroll.scroll_to_bottom();
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        self.log_scroll.scroll_to_bottom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;
    use crate::bridge::EventSender;
    use crate::context::ClientSettings;
    use crate::focus::Mode;
    use crate::lifecycle::{ConnectTarget, ConnectionHandle, Connector};

    struct NullConnector;

    impl Connector for NullConnector {
        fn connect(&self, _target: ConnectTarget, _bridge: EventSender) -> ConnectionHandle {
            ConnectionHandle::detached().0
        }
    }

    fn app() -> App {
        let (tx, _rx) = bridge::channel();
        let context = AppContext::new(ClientSettings::default(), tx, Box::new(NullConnector));
        App::new(context, LogBuffer::new(), 24)
    }

    fn fill_form(app: &mut App, name: &str, address: &str, channels: &str) {
        app.open_form();
        name.chars().for_each(|c| app.form.insert_char(c));
        app.form_enter();
        address.chars().for_each(|c| app.form.insert_char(c));
        app.form_enter();
        app.form_enter();
        channels.chars().for_each(|c| app.form.insert_char(c));
        app.form_enter();
        app.form_enter();
    }

    #[test]
    fn first_resize_flushes_buffered_lines() {
        let mut app = app();
        fill_form(&mut app, "net1", "irc.example:6697", "#a");
        assert!(app.context.active_lines().is_empty());

        app.on_resize(80, 24);
        assert_eq!(app.context.active_lines().len(), 1);
        assert_eq!(app.size, Some((80, 24)));
    }

    #[test]
    fn submitted_form_selects_the_new_channel_row() {
        let mut app = app();
        fill_form(&mut app, "net1", "irc.example:6697", "#a,#b");
        assert_eq!(app.context.focus.mode(), Mode::Chat);
        assert_eq!(app.selected_row, 1);
    }

    #[test]
    fn invalid_form_shows_error() {
        let mut app = app();
        fill_form(&mut app, "net1", "irc.example", "");
        assert_eq!(app.context.focus.mode(), Mode::Form);
        assert_eq!(
            app.form.error.as_deref(),
            Some("error: invalid server address \"irc.example\": missing port")
        );
        assert!(app.context.registry.is_empty());
    }

    #[test]
    fn deleting_the_last_rows_clamps_selection() {
        let mut app = app();
        fill_form(&mut app, "net1", "irc.example:6697", "#a");
        app.select_next();
        app.select_next();
        assert_eq!(app.selected(), Some(ListRow::AddPlaceholder));

        app.select_prev();
        app.delete_selected();
        assert_eq!(app.rows(), vec![ListRow::AddPlaceholder]);
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.context.focus.mode(), Mode::Form);
    }

    #[test]
    fn placeholder_opens_a_blank_form() {
        let mut app = app();
        app.form.insert_char('x');
        app.activate_selected();
        assert_eq!(app.context.focus.mode(), Mode::Form);
        assert_eq!(app.form.values().name, "");
    }
}
