// Focus state machine
//
// Which pane receives keys, what the right pane shows, and which
// (session, channel) log is materialized into the chat view.

use crate::events::{SessionId, SYS_KEY};

/// Pane receiving keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    ServerList,
    #[default]
    RightPane,
}

/// What the right pane shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Form,
    Chat,
}

/// Current pane, mode and active (session, channel)
///
/// In `Chat` the session is either a live registry entry or unset; in
/// `Form` no session is implied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusState {
    pane: Pane,
    mode: Mode,
    session: Option<SessionId>,
    channel: String,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Active session, only meaningful in Chat mode
    pub fn session(&self) -> Option<SessionId> {
        match self.mode {
            Mode::Chat => self.session,
            Mode::Form => None,
        }
    }

    /// Active channel key (`SYS_KEY` for the system log)
    pub fn channel(&self) -> &str {
        if self.channel.is_empty() {
            SYS_KEY
        } else {
            &self.channel
        }
    }

    /// Right pane shows the creation form
    pub fn open_form(&mut self) {
        self.mode = Mode::Form;
        self.pane = Pane::RightPane;
        self.session = None;
        self.channel.clear();
    }

    /// Right pane shows `(session, channel)`; `None` selects the system log
    pub fn activate(&mut self, session: SessionId, channel: Option<&str>) {
        self.mode = Mode::Chat;
        self.pane = Pane::RightPane;
        self.session = Some(session);
        self.channel = channel.unwrap_or(SYS_KEY).to_string();
    }

    /// Reset if `session` was the active one; returns whether it was
    ///
    /// Only the mode goes back to Form. The pane is kept, so a delete from
    /// the server list leaves keyboard focus on the list.
    pub fn session_removed(&mut self, session: SessionId) -> bool {
        if self.session != Some(session) {
            return false;
        }
        self.mode = Mode::Form;
        self.session = None;
        self.channel.clear();
        true
    }

    pub fn focus_servers(&mut self) {
        self.pane = Pane::ServerList;
    }

    pub fn focus_right(&mut self) {
        self.pane = Pane::RightPane;
    }

    /// Whether `(session, channel)` is what the chat view currently shows
    pub fn is_viewing(&self, session: SessionId, channel: &str) -> bool {
        self.session() == Some(session) && self.channel() == channel
    }
}
