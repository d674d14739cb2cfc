//! Per-session channel logs with readiness buffering
//!
//! Until the view has been sized the store is `Buffering`: every line is
//! parked in its session's pending queue. The single `Buffering -> Live`
//! transition replays each queue in order and from then on lines are
//! appended directly. Logs are append-only.

use crate::events::{LineKind, LogLine, SessionId, SYS_KEY};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Whether the view can display content yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Buffering,
    Live,
}

/// A line as kept in a channel log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLine {
    pub text: String,
    pub kind: LineKind,
}

#[derive(Debug, Default)]
struct SessionLogs {
    channels: HashMap<String, Vec<StoredLine>>,
    pending: VecDeque<LogLine>,
}

impl SessionLogs {
    fn new() -> Self {
        let mut logs = Self::default();
        logs.channels.insert(SYS_KEY.to_string(), Vec::new());
        logs
    }

    fn append(&mut self, line: LogLine) {
        let mirror = line.mirror && line.targets_channel();
        let key = line.key().to_string();
        let stored = StoredLine {
            text: line.text,
            kind: line.kind,
        };

        if mirror {
            self.channels
                .entry(SYS_KEY.to_string())
                .or_default()
                .push(stored.clone());
        }
        self.channels.entry(key).or_default().push(stored);
    }
}

/// What happened to a line handed to `apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Appended to the log (and mirrored where applicable)
    Appended,
    /// Parked until the view is ready
    Queued,
    /// Session unknown (already removed)
    Dropped,
}

/// All channel logs, keyed by session
#[derive(Debug, Default)]
pub struct LogStore {
    readiness: Readiness,
    sessions: BTreeMap<SessionId, SessionLogs>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a session; its system log exists from here on
    pub fn open(&mut self, session: SessionId) {
        self.sessions.entry(session).or_insert_with(SessionLogs::new);
    }

    /// Forget a session, its logs and anything still pending for it
    pub fn close(&mut self, session: SessionId) -> usize {
        self.sessions
            .remove(&session)
            .map(|logs| logs.pending.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn contains(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    /// Route one line to its log, or to the pending queue before readiness
    pub fn apply(&mut self, line: LogLine) -> Applied {
        let Some(logs) = self.sessions.get_mut(&line.session) else {
            tracing::debug!(session = %line.session, "dropping line for removed session");
            return Applied::Dropped;
        };

        match self.readiness {
            Readiness::Buffering => {
                logs.pending.push_back(line);
                Applied::Queued
            }
            Readiness::Live => {
                logs.append(line);
                Applied::Appended
            }
        }
    }

    /// Transition to `Live`, replaying every pending queue in FIFO order
    ///
    /// Returns how many lines were replayed. Calling it again is a no-op.
    pub fn mark_ready(&mut self) -> usize {
        self.readiness = Readiness::Live;

        let mut replayed = 0;
        for logs in self.sessions.values_mut() {
            while let Some(line) = logs.pending.pop_front() {
                logs.append(line);
                replayed += 1;
            }
        }
        replayed
    }

    /// Number of lines waiting for readiness in `session`'s queue
    #[cfg(test)]
    pub fn pending_len(&self, session: SessionId) -> usize {
        self.sessions
            .get(&session)
            .map(|logs| logs.pending.len())
            .unwrap_or(0)
    }

    /// Full ordered log for `(session, channel)`; empty if nothing was written
    pub fn lines(&self, session: SessionId, channel: &str) -> &[StoredLine] {
        let key = if channel.is_empty() { SYS_KEY } else { channel };
        self.sessions
            .get(&session)
            .and_then(|logs| logs.channels.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u64) -> SessionId {
        SessionId::new(n)
    }

    fn texts(store: &LogStore, session: SessionId, channel: &str) -> Vec<String> {
        store
            .lines(session, channel)
            .iter()
            .map(|l| l.text.clone())
            .collect()
    }

    #[test]
    fn opened_session_has_empty_system_log() {
        let mut store = LogStore::new();
        store.open(sid(1));
        assert!(store.contains(sid(1)));
        assert!(store.lines(sid(1), SYS_KEY).is_empty());
        assert!(store.lines(sid(1), "#a").is_empty());
    }

    #[test]
    fn buffering_holds_lines_back() {
        let mut store = LogStore::new();
        store.open(sid(1));

        assert_eq!(store.apply(LogLine::system(sid(1), "a")), Applied::Queued);
        assert!(store.lines(sid(1), SYS_KEY).is_empty());
        assert_eq!(store.pending_len(sid(1)), 1);
    }

    #[test]
    fn drain_preserves_push_order_per_session() {
        let mut store = LogStore::new();
        store.open(sid(1));
        store.open(sid(2));

        for n in 0..5 {
            store.apply(LogLine::system(sid(1), format!("one-{n}")));
            store.apply(LogLine::system(sid(2), format!("two-{n}")));
        }

        assert_eq!(store.mark_ready(), 10);
        assert_eq!(
            texts(&store, sid(1), SYS_KEY),
            (0..5).map(|n| format!("one-{n}")).collect::<Vec<_>>()
        );
        assert_eq!(
            texts(&store, sid(2), SYS_KEY),
            (0..5).map(|n| format!("two-{n}")).collect::<Vec<_>>()
        );
        assert_eq!(store.pending_len(sid(1)), 0);
    }

    #[test]
    fn second_ready_transition_changes_nothing() {
        let mut store = LogStore::new();
        store.open(sid(1));
        store.apply(LogLine::channel(sid(1), "#a", "hello", LineKind::Message));

        assert_eq!(store.mark_ready(), 1);
        let once_sys = texts(&store, sid(1), SYS_KEY);
        let once_chan = texts(&store, sid(1), "#a");

        assert_eq!(store.mark_ready(), 0);
        assert_eq!(texts(&store, sid(1), SYS_KEY), once_sys);
        assert_eq!(texts(&store, sid(1), "#a"), once_chan);
    }

    #[test]
    fn channel_lines_mirror_into_system_log_once() {
        let mut store = LogStore::new();
        store.open(sid(1));
        store.mark_ready();

        store.apply(LogLine::channel(sid(1), "#a", "chan", LineKind::Message));
        store.apply(LogLine::system(sid(1), "sys"));

        assert_eq!(texts(&store, sid(1), "#a"), vec!["chan"]);
        assert_eq!(texts(&store, sid(1), SYS_KEY), vec!["chan", "sys"]);
    }

    #[test]
    fn explicit_system_key_is_not_mirrored_twice() {
        let mut store = LogStore::new();
        store.open(sid(1));
        store.mark_ready();

        store.apply(LogLine::channel(sid(1), SYS_KEY, "direct", LineKind::Status));
        assert_eq!(texts(&store, sid(1), SYS_KEY), vec!["direct"]);
    }

    #[test]
    fn local_lines_stay_in_their_channel() {
        let mut store = LogStore::new();
        store.open(sid(1));
        store.mark_ready();

        store.apply(LogLine::local(sid(1), Some("#a"), "usage"));
        assert_eq!(texts(&store, sid(1), "#a"), vec!["usage"]);
        assert!(store.lines(sid(1), SYS_KEY).is_empty());
    }

    #[test]
    fn unknown_session_is_dropped_in_both_states() {
        let mut store = LogStore::new();
        assert_eq!(store.apply(LogLine::system(sid(9), "x")), Applied::Dropped);
        store.mark_ready();
        assert_eq!(store.apply(LogLine::system(sid(9), "x")), Applied::Dropped);
        assert!(store.lines(sid(9), SYS_KEY).is_empty());
    }

    #[test]
    fn closing_discards_pending_lines() {
        let mut store = LogStore::new();
        store.open(sid(1));
        for n in 0..3 {
            store.apply(LogLine::system(sid(1), format!("{n}")));
        }

        assert_eq!(store.close(sid(1)), 3);
        assert_eq!(store.mark_ready(), 0);
        assert!(!store.contains(sid(1)));
    }
}
