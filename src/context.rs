// Application context - the single consumer of domain events
//
// Everything the UI thread owns lives here: the session registry, the log
// store, focus, and the means to start connections. The terminal layer
// translates keys into calls on this type and renders what it exposes;
// nothing in here depends on the terminal.

use crate::bridge::EventSender;
use crate::commands::SlashCommand;
use crate::config::ServerPreset;
use crate::events::{DomainEvent, LineKind, LogLine, SessionId, SYS_KEY};
use crate::focus::FocusState;
use crate::lifecycle::Connector;
use crate::rows::{build_rows, ListRow};
use crate::session::{ConfigError, SessionConfig, SessionForm, SessionRegistry};
use crate::store::{LogStore, StoredLine};
use chrono::Local;
use std::time::Duration;

/// Seeded into `_sys` and every pre-declared channel when a session is created
pub const BANNER: &str = r"
   ________  __  ______  ___
  /_  /  / / / / / ___/ / _ \
   / /_ / /_/ / (__  ) /  __/
  /___/ \__,_/ /____/  \___/

  joining...";

/// Seeded into a channel added with /join
pub const CHAT_INITIALIZED: &str = "─── Chat initialized ───";

pub const NO_CHANNEL_SELECTED: &str = "-- no channel selected, use /join #chan or select an item --";

/// Defaults applied to sessions and connections
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Used when the form (or a preset) leaves the nick empty
    pub default_nick: String,
    pub quit_message: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            default_nick: "zuse".to_string(),
            quit_message: "bye".to_string(),
            connect_timeout: Some(Duration::from_secs(30)),
        }
    }
}

pub struct AppContext {
    pub registry: SessionRegistry,
    pub store: LogStore,
    pub focus: FocusState,
    bridge: EventSender,
    connector: Box<dyn Connector>,
    settings: ClientSettings,
}

impl AppContext {
    pub fn new(settings: ClientSettings, bridge: EventSender, connector: Box<dyn Connector>) -> Self {
        Self {
            registry: SessionRegistry::new(settings.quit_message.clone()),
            store: LogStore::new(),
            focus: FocusState::new(),
            bridge,
            connector,
            settings,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Consumer side
    // ─────────────────────────────────────────────────────────────

    /// Apply one event from the bridge
    ///
    /// Events for sessions that no longer exist are dropped. State changes
    /// take effect immediately; the lines they produce go through the store
    /// and so respect readiness.
    pub fn handle_event(&mut self, event: DomainEvent) {
        let id = event.session();
        let Some(session) = self.registry.get_mut(id) else {
            tracing::debug!(session = %id, ?event, "dropping event for removed session");
            return;
        };

        match event {
            DomainEvent::Line(line) => {
                self.store.apply(line);
            }
            DomainEvent::Connected { .. } => {
                session.mark_connected();
                tracing::info!(session = %id, "connected");
            }
            DomainEvent::Disconnected { error, .. } => {
                session.mark_disconnected();
                let text = match &error {
                    Some(e) => format!("-- disconnected -- ({e})"),
                    None => "-- disconnected --".to_string(),
                };
                tracing::info!(session = %id, error = error.as_deref(), "disconnected");
                self.store.apply(LogLine::system(id, text));
            }
            DomainEvent::Joined { channel, .. } => {
                session.add_channel(&channel);
                session.joined.insert(channel);
            }
        }
    }

    /// The view has its first size; flush everything buffered so far
    pub fn mark_ready(&mut self) -> usize {
        let flushed = self.store.mark_ready();
        if flushed > 0 {
            tracing::debug!(flushed, "flushed buffered lines");
        }
        flushed
    }

    // ─────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────

    /// Register a session and seed its banner lines
    pub fn create_session(&mut self, config: SessionConfig) -> SessionId {
        let channels = config.channels.clone();
        let id = self.registry.create(config);
        self.store.open(id);

        self.store.apply(LogLine::local(id, None, BANNER));
        for channel in &channels {
            self.store.apply(LogLine::local(id, Some(channel.as_str()), BANNER));
        }
        id
    }

    /// Start a connection unless one is already live; true if started
    pub fn connect(&mut self, id: SessionId) -> bool {
        let Some(session) = self.registry.get_mut(id) else {
            return false;
        };
        if session.is_live() {
            return false;
        }
        let target = session.connect_target(self.settings.connect_timeout);
        let handle = self.connector.connect(target, self.bridge.clone());
        session.begin_connect(handle);
        true
    }

    /// Remove a session, quitting its connection and resetting focus
    pub fn remove_session(&mut self, id: SessionId) -> bool {
        let Some(session) = self.registry.remove(id) else {
            return false;
        };
        let discarded = self.store.close(id);
        if discarded > 0 {
            tracing::debug!(session = %id, discarded, "discarded buffered lines");
        }
        self.focus.session_removed(id);
        tracing::info!(session = %id, name = %session.name, "deleted");
        true
    }

    /// Quit every session; returns how many had a live connection
    pub fn shutdown(&mut self) -> usize {
        let ids: Vec<SessionId> = self.registry.iter().map(|s| s.id).collect();
        let live = self.registry.iter().filter(|s| s.is_live()).count();
        for id in ids {
            self.remove_session(id);
        }
        live
    }

    /// Sessions from the config file; invalid presets are skipped
    pub fn load_presets(&mut self, presets: &[ServerPreset]) -> Vec<SessionId> {
        let mut created = Vec::new();
        for preset in presets {
            let config = match SessionConfig::from_form(&preset.to_form(), &self.settings.default_nick) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(name = %preset.name, "skipping server preset: {}", e);
                    continue;
                }
            };
            let id = self.create_session(config);
            if preset.autoconnect {
                self.connect(id);
            }
            created.push(id);
        }
        created
    }

    // ─────────────────────────────────────────────────────────────
    // Server list
    // ─────────────────────────────────────────────────────────────

    pub fn rows(&self) -> Vec<ListRow> {
        build_rows(&self.registry)
    }

    /// Activate a row: open the form, or show the log and make sure the
    /// session is connected and the channel joined
    pub fn select_row(&mut self, row: &ListRow) {
        let (id, channel) = match row {
            ListRow::AddPlaceholder => {
                self.focus.open_form();
                return;
            }
            ListRow::Session { session, channel } => (*session, channel.as_deref()),
        };
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };

        if !session.is_live() {
            self.focus.activate(id, channel);
            self.connect(id);
            return;
        }

        if let Some(channel) = channel {
            if session.is_connected() && !session.joined.contains(channel) {
                if let Some(connection) = session.connection() {
                    connection.join(channel);
                }
                session.joined.insert(channel.to_string());
            }
        }
        self.focus.activate(id, channel);
    }

    /// Delete the session a row belongs to; the placeholder is ignored
    pub fn delete_row(&mut self, row: &ListRow) -> bool {
        match row.session() {
            Some(id) => self.remove_session(id),
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Right pane
    // ─────────────────────────────────────────────────────────────

    /// Validate the form, create the session, show it and connect
    pub fn submit_form(&mut self, form: &SessionForm) -> Result<SessionId, ConfigError> {
        let config = SessionConfig::from_form(form, &self.settings.default_nick)?;
        let first = config.channels.first().cloned();
        let id = self.create_session(config);
        self.focus.activate(id, first.as_deref());
        self.connect(id);
        Ok(id)
    }

    /// Handle one line typed into the chat input
    pub fn submit_chat(&mut self, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            return;
        }
        let Some(id) = self.focus.session() else {
            return;
        };
        let channel = self.focus.channel().to_string();

        if let Some(command) = SlashCommand::parse(text) {
            self.run_command(id, &channel, command);
            return;
        }
        if channel == SYS_KEY {
            self.feedback(id, &channel, NO_CHANNEL_SELECTED);
            return;
        }

        let Some(session) = self.registry.get(id) else {
            return;
        };
        if let Some(connection) = session.connection() {
            connection.send_message(&channel, text);
        }
        let line = format!("[{}] <{}> {}", Local::now().format("%H:%M"), session.nick, text);
        self.store
            .apply(LogLine::channel(id, channel, line, LineKind::OwnMessage));
    }

    fn run_command(&mut self, id: SessionId, channel: &str, command: SlashCommand) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };

        match command {
            SlashCommand::Usage(usage) => self.feedback(id, channel, usage),
            SlashCommand::Join(target) => {
                if session.is_live() && !session.joined.contains(&target) {
                    if let Some(connection) = session.connection() {
                        connection.join(&target);
                    }
                }
                session.joined.insert(target.clone());
                if session.add_channel(&target) {
                    self.store
                        .apply(LogLine::local(id, Some(target.as_str()), CHAT_INITIALIZED));
                }
                self.feedback(id, channel, &format!("-- joined {target} --"));
            }
            SlashCommand::Nick(nick) => {
                if let Some(connection) = session.connection() {
                    connection.set_nick(&nick);
                }
                self.feedback(id, channel, &format!("-- nick change requested: {nick}"));
            }
            SlashCommand::Quit => {
                if let Some(connection) = session.connection() {
                    connection.quit(&self.settings.quit_message);
                }
            }
            SlashCommand::Msg { target, text } => {
                if let Some(connection) = session.connection() {
                    connection.send_message(&target, &text);
                }
                self.feedback(id, channel, &format!("[to {target}] {text}"));
            }
            SlashCommand::Unknown(name) => {
                self.feedback(id, channel, &format!("unknown command: {name}"));
            }
        }
    }

    fn feedback(&mut self, id: SessionId, channel: &str, text: &str) {
        self.store.apply(LogLine::local(id, Some(channel), text));
    }

    /// Lines of the active (session, channel); empty in Form mode
    pub fn active_lines(&self) -> &[StoredLine] {
        match self.focus.session() {
            Some(id) => self.store.lines(id, self.focus.channel()),
            None => &[],
        }
    }
}
