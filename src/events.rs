// Events that flow from the connection tasks to the UI consumer
//
// A DomainEvent is the only payload ever carried on the event bridge. It is
// an owned, immutable value: producers build it, hand it over, and never
// touch it again. Everything the consumer mutates (sessions, logs, focus)
// stays on the consumer's side of the bridge.

use std::fmt;

/// Reserved channel key for session-wide traffic
pub const SYS_KEY: &str = "_sys";

/// Opaque session handle, allocated monotonically and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// How a line should be styled when rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Someone else's message
    Message,
    /// A message typed by the local user
    OwnMessage,
    /// Status traffic: joins, numerics, banners, command feedback
    Status,
}

/// One rendered line addressed to a (session, channel) log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub session: SessionId,
    /// Target channel; `None` means the session's system log
    pub channel: Option<String>,
    pub text: String,
    pub kind: LineKind,
    /// Copy into the system log when the target is a real channel
    pub mirror: bool,
}

impl LogLine {
    /// A line for the system log of `session`
    pub fn system(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session,
            channel: None,
            text: text.into(),
            kind: LineKind::Status,
            mirror: false,
        }
    }

    /// A line for `channel` that is mirrored into the system log
    pub fn channel(
        session: SessionId,
        channel: impl Into<String>,
        text: impl Into<String>,
        kind: LineKind,
    ) -> Self {
        Self {
            session,
            channel: Some(channel.into()),
            text: text.into(),
            kind,
            mirror: true,
        }
    }

    /// A status line shown only in `channel` (banners, command feedback)
    pub fn local(session: SessionId, channel: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            session,
            channel: channel.map(str::to_string),
            text: text.into(),
            kind: LineKind::Status,
            mirror: false,
        }
    }

    /// Resolved channel key, `SYS_KEY` for system lines
    pub fn key(&self) -> &str {
        match self.channel.as_deref() {
            Some(channel) if !channel.is_empty() => channel,
            _ => SYS_KEY,
        }
    }

    pub fn targets_channel(&self) -> bool {
        self.key() != SYS_KEY
    }
}

/// Main event type that flows through the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A line to append to a session log
    Line(LogLine),

    /// The protocol handshake completed
    Connected { session: SessionId },

    /// The connection ended, or never came up
    Disconnected {
        session: SessionId,
        error: Option<String>,
    },

    /// The server confirmed our own JOIN for a channel
    Joined { session: SessionId, channel: String },
}

impl DomainEvent {
    /// Session this event is addressed to
    pub fn session(&self) -> SessionId {
        match self {
            DomainEvent::Line(line) => line.session,
            DomainEvent::Connected { session }
            | DomainEvent::Disconnected { session, .. }
            | DomainEvent::Joined { session, .. } => *session,
        }
    }
}

impl From<LogLine> for DomainEvent {
    fn from(line: LogLine) -> Self {
        DomainEvent::Line(line)
    }
}
