// Session registry
//
// Owns every configured connection and its metadata. Only the UI consumer
// touches it: connection tasks get a read-only snapshot (ConnectTarget) when
// they start and report back exclusively through the event bridge.

mod config;

pub use config::{ConfigError, ServerAddress, SessionConfig, SessionForm};

use crate::events::SessionId;
use crate::lifecycle::{ConnectTarget, ConnectionHandle, ConnectionState};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// One configured connection to a chat server
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub nick: String,
    pub address: ServerAddress,
    pub tls: bool,
    /// Channels the user wants to be in, in the order they were added
    pub channels: Vec<String>,
    /// Channels the server has confirmed (or we have requested while connected)
    pub joined: HashSet<String>,
    state: ConnectionState,
    connection: Option<ConnectionHandle>,
}

impl Session {
    fn new(id: SessionId, config: SessionConfig) -> Self {
        Self {
            id,
            name: config.name,
            nick: config.nick,
            address: config.address,
            tls: config.tls,
            channels: config.channels,
            joined: HashSet::new(),
            state: ConnectionState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Connecting or Connected with a handle in place
    pub fn is_live(&self) -> bool {
        self.connection.is_some() && self.state != ConnectionState::Disconnected
    }

    pub fn connection(&self) -> Option<&ConnectionHandle> {
        self.connection.as_ref()
    }

    /// Snapshot handed to a new connection task
    pub fn connect_target(&self, timeout: Option<Duration>) -> ConnectTarget {
        ConnectTarget {
            session: self.id,
            address: self.address.clone(),
            tls: self.tls,
            nick: self.nick.clone(),
            channels: self.channels.clone(),
            timeout,
        }
    }

    /// Disconnected -> Connecting
    pub fn begin_connect(&mut self, handle: ConnectionHandle) {
        self.state = ConnectionState::Connecting;
        self.connection = Some(handle);
    }

    /// Connecting -> Connected
    pub fn mark_connected(&mut self) {
        if self.connection.is_some() {
            self.state = ConnectionState::Connected;
        }
    }

    /// Any -> Disconnected; forgets joins so the next connect rejoins all
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.connection = None;
        self.joined.clear();
    }

    /// Add a desired channel; false if it was already there
    pub fn add_channel(&mut self, channel: &str) -> bool {
        if self.channels.iter().any(|c| c == channel) {
            return false;
        }
        self.channels.push(channel.to_string());
        true
    }
}

/// Owns all active sessions, keyed by id
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, Session>,
    next_id: u64,
    quit_message: String,
}

impl SessionRegistry {
    pub fn new(quit_message: impl Into<String>) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            quit_message: quit_message.into(),
        }
    }

    /// Register a new, disconnected session under a fresh id
    pub fn create(&mut self, config: SessionConfig) -> SessionId {
        let id = SessionId::new(self.next_id);
        self.next_id += 1;

        tracing::info!(session = %id, name = %config.name, address = %config.address, "session created");
        self.sessions.insert(id, Session::new(id, config));
        id
    }

    /// Drop a session, asking its connection (if any) to quit and close
    ///
    /// Does not wait for the connection to go away. Callers must reset any
    /// focus that still names `id`.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let mut session = self.sessions.remove(&id)?;
        if let Some(connection) = session.connection.take() {
            connection.quit(&self.quit_message);
            connection.close();
        }
        tracing::info!(session = %id, "session removed");
        Some(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Sessions in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
