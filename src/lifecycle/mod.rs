// Connection lifecycle - one task per live session
//
// Disconnected -> Connecting -> Connected -> Disconnected. There is no
// automatic retry: getting back to Connecting always takes a user action.
//
// The UI thread never touches protocol types. It holds a ConnectionHandle,
// which is just an outbound command queue into the session's task, and it
// learns about everything else from DomainEvents on the bridge.

mod client;
pub mod mapping;

pub use client::IrcConnector;
pub use mapping::{EventMapper, Occurrence};

use crate::bridge::EventSender;
use crate::events::SessionId;
use crate::session::ServerAddress;
use std::time::Duration;
use tokio::sync::mpsc;

/// Where a session's connection currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Requests the UI sends into a connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Join(String),
    Nick(String),
    Message { target: String, text: String },
    Quit(String),
    Close,
}

/// Everything a connection task needs, snapshotted when Connect is issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub session: SessionId,
    pub address: ServerAddress,
    pub tls: bool,
    pub nick: String,
    pub channels: Vec<String>,
    /// `None` waits on the connect call indefinitely
    pub timeout: Option<Duration>,
}

/// UI-side handle to a running connection task
///
/// All calls are fire-and-forget: they queue a request and return.
/// Dropping the handle closes the queue, which the task treats as Close.
#[derive(Debug)]
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(commands: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { commands }
    }

    /// A handle with no task behind it; the receiver sees every request
    #[cfg(test)]
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn join(&self, channel: &str) {
        self.request(Outbound::Join(channel.to_string()));
    }

    pub fn set_nick(&self, nick: &str) {
        self.request(Outbound::Nick(nick.to_string()));
    }

    pub fn send_message(&self, target: &str, text: &str) {
        self.request(Outbound::Message {
            target: target.to_string(),
            text: text.to_string(),
        });
    }

    pub fn quit(&self, reason: &str) {
        self.request(Outbound::Quit(reason.to_string()));
    }

    /// Ask the task to shut the socket; does not wait for it
    pub fn close(&self) {
        self.request(Outbound::Close);
    }

    fn request(&self, command: Outbound) {
        if self.commands.send(command).is_err() {
            tracing::warn!("connection task already gone, request dropped");
        }
    }
}

/// Starts connection tasks; the UI depends on this rather than the protocol
pub trait Connector {
    /// Spawn a task connecting `target`, reporting through `bridge`
    fn connect(&self, target: ConnectTarget, bridge: EventSender) -> ConnectionHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_handle_records_requests_in_order() {
        let (handle, mut rx) = ConnectionHandle::detached();
        handle.join("#a");
        handle.set_nick("other");
        handle.send_message("#a", "hi");
        handle.quit("bye");
        handle.close();

        let mut seen = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            seen.push(cmd);
        }
        assert_eq!(
            seen,
            vec![
                Outbound::Join("#a".into()),
                Outbound::Nick("other".into()),
                Outbound::Message {
                    target: "#a".into(),
                    text: "hi".into()
                },
                Outbound::Quit("bye".into()),
                Outbound::Close,
            ]
        );
    }

    #[test]
    fn requests_after_task_exit_are_ignored() {
        let (handle, rx) = ConnectionHandle::detached();
        drop(rx);
        handle.join("#a");
        handle.close();
    }
}
