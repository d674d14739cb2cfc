//! Protocol occurrences and their translation into domain events
//!
//! The connection task reduces every inbound protocol message to an
//! [`Occurrence`]; [`EventMapper`] turns each occurrence into zero or more
//! [`DomainEvent`]s. Both steps are pure, so the routing rules (which
//! channel a line lands in, which numerics are dropped) are tested here
//! without a socket.

use crate::events::{DomainEvent, LineKind, LogLine, SessionId};
use chrono::{DateTime, NaiveTime};

/// Bulk listing replies that would flood the system log
pub const IGNORED_NUMERICS: &[&str] = &[
    "315", // RPL_ENDOFWHO
    "352", // RPL_WHOREPLY
    "353", // RPL_NAMREPLY
    "354", // RPL_WHOSPCRPL
];

/// Registration and server-info replies, always shown in the system log
pub const INFORMATIONAL_NUMERICS: &[&str] = &[
    "001", "002", "003", "004", "005", // welcome burst
    "250", "251", "252", "253", "254", "255", "265", "266", // luser stats
    "375", "372", "376", "422", // motd
];

const RPL_TOPIC: &str = "332";
const RPL_TOPICWHOTIME: &str = "333";
const RPL_ENDOFNAMES: &str = "366";

/// One thing the server told us, stripped of wire detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occurrence {
    /// Registration finished (welcome received)
    Connected,
    /// The connection ended or could not be established
    Disconnected { error: Option<String> },
    Message {
        source: String,
        target: String,
        text: String,
    },
    Notice {
        source: String,
        target: String,
        text: String,
    },
    Action {
        source: String,
        target: String,
        text: String,
    },
    Join {
        nick: String,
        channel: String,
        /// The JOIN is our own, echoed back by the server
        own: bool,
    },
    Part {
        nick: String,
        channel: String,
    },
    Quit {
        nick: String,
    },
    Topic {
        channel: String,
        topic: String,
    },
    TopicMeta {
        channel: String,
        setter: String,
        set_at: String,
    },
    EndOfNames {
        channel: String,
    },
    /// Welcome/MOTD/luser class reply
    Informational { params: Vec<String> },
    /// Any other numeric reply
    Numeric { code: String, params: Vec<String> },
}

impl Occurrence {
    /// Classify a numeric reply; `None` for ignored or malformed ones
    ///
    /// `params` are the reply's parameters, first one being our own nick.
    pub fn from_numeric(code: &str, params: Vec<String>) -> Option<Self> {
        if IGNORED_NUMERICS.contains(&code) {
            return None;
        }

        match code {
            RPL_TOPIC => match params.as_slice() {
                [_, channel, topic, ..] => Some(Self::Topic {
                    channel: channel.clone(),
                    topic: topic.clone(),
                }),
                _ => None,
            },
            RPL_TOPICWHOTIME => match params.as_slice() {
                [_, channel, setter, set_at, ..] => Some(Self::TopicMeta {
                    channel: channel.clone(),
                    setter: setter.clone(),
                    set_at: set_at.clone(),
                }),
                _ => None,
            },
            RPL_ENDOFNAMES => match params.as_slice() {
                [_, channel, ..] => Some(Self::EndOfNames {
                    channel: channel.clone(),
                }),
                _ => None,
            },
            _ if INFORMATIONAL_NUMERICS.contains(&code) => Some(Self::Informational { params }),
            _ => Some(Self::Numeric {
                code: code.to_string(),
                params,
            }),
        }
    }
}

/// Channel a target addresses, `None` when it is a nick (ours)
pub fn channel_target(target: &str) -> Option<&str> {
    target.starts_with('#').then_some(target)
}

/// Translates one session's occurrences into domain events
#[derive(Debug, Clone)]
pub struct EventMapper {
    session: SessionId,
    address: String,
}

impl EventMapper {
    pub fn new(session: SessionId, address: impl Into<String>) -> Self {
        Self {
            session,
            address: address.into(),
        }
    }

    pub fn map(&self, occurrence: Occurrence, at: NaiveTime) -> Vec<DomainEvent> {
        let stamp = at.format("%H:%M").to_string();
        match occurrence {
            Occurrence::Connected => self.connected(),
            Occurrence::Disconnected { error } => self.disconnected(error),
            Occurrence::Message {
                source,
                target,
                text,
            } => self.message(&stamp, &source, &target, &text),
            Occurrence::Notice { target, text, .. } => self.notice(&stamp, &target, &text),
            Occurrence::Action {
                source,
                target,
                text,
            } => self.action(&stamp, &source, &target, &text),
            Occurrence::Join { nick, channel, own } => self.join(&stamp, &nick, channel, own),
            Occurrence::Part { nick, channel } => self.part(&stamp, &nick, &channel),
            Occurrence::Quit { nick } => self.quit(&stamp, &nick),
            Occurrence::Topic { channel, topic } => self.topic(&channel, &topic),
            Occurrence::TopicMeta {
                channel,
                setter,
                set_at,
            } => self.topic_meta(&channel, &setter, &set_at),
            Occurrence::EndOfNames { channel } => self.end_of_names(&channel),
            Occurrence::Informational { params } => self.informational(&stamp, &params),
            Occurrence::Numeric { code, params } => self.numeric(&stamp, &code, &params),
        }
    }

    fn connected(&self) -> Vec<DomainEvent> {
        vec![
            LogLine::system(self.session, format!("-- connected to {} --", self.address)).into(),
            DomainEvent::Connected {
                session: self.session,
            },
        ]
    }

    fn disconnected(&self, error: Option<String>) -> Vec<DomainEvent> {
        vec![DomainEvent::Disconnected {
            session: self.session,
            error,
        }]
    }

    fn message(&self, stamp: &str, source: &str, target: &str, text: &str) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] <{source}> {text}");
        vec![self.routed(channel_target(target), line, LineKind::Message)]
    }

    fn notice(&self, stamp: &str, target: &str, text: &str) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] -NOTICE- {text}");
        vec![self.routed(channel_target(target), line, LineKind::Status)]
    }

    fn action(&self, stamp: &str, source: &str, target: &str, text: &str) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] * {source} {text}");
        vec![self.routed(channel_target(target), line, LineKind::Status)]
    }

    fn join(&self, stamp: &str, nick: &str, channel: String, own: bool) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] * {nick} joined {channel}");
        let mut events = vec![self.routed(Some(&channel), line, LineKind::Status)];
        if own {
            events.push(DomainEvent::Joined {
                session: self.session,
                channel,
            });
        }
        events
    }

    fn part(&self, stamp: &str, nick: &str, channel: &str) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] * {nick} left {channel}");
        vec![self.routed(Some(channel), line, LineKind::Status)]
    }

    fn quit(&self, stamp: &str, nick: &str) -> Vec<DomainEvent> {
        vec![LogLine::system(self.session, format!("[{stamp}] * {nick} quit")).into()]
    }

    fn topic(&self, channel: &str, topic: &str) -> Vec<DomainEvent> {
        vec![self.routed(Some(channel), format!("— topic: {topic}"), LineKind::Status)]
    }

    fn topic_meta(&self, channel: &str, setter: &str, set_at: &str) -> Vec<DomainEvent> {
        let when = set_at
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| set_at.to_string());
        let line = format!("— set by {setter} @ {when}");
        vec![self.routed(Some(channel), line, LineKind::Status)]
    }

    fn end_of_names(&self, channel: &str) -> Vec<DomainEvent> {
        vec![self.routed(Some(channel), "— end of names".to_string(), LineKind::Status)]
    }

    fn informational(&self, stamp: &str, params: &[String]) -> Vec<DomainEvent> {
        let line = format!("[{stamp}] {}", params.join(" "));
        vec![LogLine::system(self.session, line).into()]
    }

    fn numeric(&self, stamp: &str, code: &str, params: &[String]) -> Vec<DomainEvent> {
        if IGNORED_NUMERICS.contains(&code) {
            return Vec::new();
        }
        let destination = params.iter().find_map(|p| channel_target(p));
        let line = format!("[{stamp}] {}", params.join(" "));
        vec![self.routed(destination, line, LineKind::Status)]
    }

    fn routed(&self, channel: Option<&str>, text: String, kind: LineKind) -> DomainEvent {
        match channel {
            Some(channel) => LogLine::channel(self.session, channel, text, kind),
            None => LogLine {
                kind,
                ..LogLine::system(self.session, text)
            },
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SYS_KEY;

    fn mapper() -> EventMapper {
        EventMapper::new(SessionId::new(1), "irc.example:6697")
    }

    fn at() -> NaiveTime {
        NaiveTime::from_hms_opt(15, 4, 0).unwrap()
    }

    fn lines(events: &[DomainEvent]) -> Vec<(&str, &str, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                DomainEvent::Line(l) => Some((l.key(), l.text.as_str(), l.mirror)),
                _ => None,
            })
            .collect()
    }

    fn strings(params: &[&str]) -> Vec<String> {
        params.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn connected_announces_then_flips_state() {
        let events = mapper().map(Occurrence::Connected, at());
        assert_eq!(
            lines(&events),
            vec![(SYS_KEY, "-- connected to irc.example:6697 --", false)]
        );
        assert_eq!(
            events.last(),
            Some(&DomainEvent::Connected {
                session: SessionId::new(1)
            })
        );
    }

    #[test]
    fn channel_message_targets_channel_and_mirrors() {
        let events = mapper().map(
            Occurrence::Message {
                source: "alice".into(),
                target: "#chan".into(),
                text: "hi there".into(),
            },
            at(),
        );
        assert_eq!(
            lines(&events),
            vec![("#chan", "[15:04] <alice> hi there", true)]
        );
    }

    #[test]
    fn direct_message_goes_to_system_without_mirror() {
        let events = mapper().map(
            Occurrence::Message {
                source: "alice".into(),
                target: "me".into(),
                text: "psst".into(),
            },
            at(),
        );
        assert_eq!(lines(&events), vec![(SYS_KEY, "[15:04] <alice> psst", false)]);
    }

    #[test]
    fn own_join_also_confirms_membership() {
        let events = mapper().map(
            Occurrence::Join {
                nick: "me".into(),
                channel: "#a".into(),
                own: true,
            },
            at(),
        );
        assert_eq!(lines(&events), vec![("#a", "[15:04] * me joined #a", true)]);
        assert!(events.contains(&DomainEvent::Joined {
            session: SessionId::new(1),
            channel: "#a".into()
        }));

        let events = mapper().map(
            Occurrence::Join {
                nick: "bob".into(),
                channel: "#a".into(),
                own: false,
            },
            at(),
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn quit_is_session_wide() {
        let events = mapper().map(Occurrence::Quit { nick: "bob".into() }, at());
        assert_eq!(lines(&events), vec![(SYS_KEY, "[15:04] * bob quit", false)]);
    }

    #[test]
    fn numeric_classification() {
        assert_eq!(
            Occurrence::from_numeric("332", strings(&["me", "#a", "the topic"])),
            Some(Occurrence::Topic {
                channel: "#a".into(),
                topic: "the topic".into()
            })
        );
        assert_eq!(Occurrence::from_numeric("332", strings(&["me", "#a"])), None);
        assert_eq!(
            Occurrence::from_numeric("366", strings(&["me", "#a", "End of /NAMES list."])),
            Some(Occurrence::EndOfNames {
                channel: "#a".into()
            })
        );
        assert!(matches!(
            Occurrence::from_numeric("001", strings(&["me", "Welcome"])),
            Some(Occurrence::Informational { .. })
        ));
        assert!(matches!(
            Occurrence::from_numeric("482", strings(&["me", "#a", "not op"])),
            Some(Occurrence::Numeric { .. })
        ));
    }

    #[test]
    fn bulk_listings_are_ignored() {
        for code in IGNORED_NUMERICS {
            assert_eq!(Occurrence::from_numeric(code, strings(&["me", "x"])), None);
            let events = mapper().map(
                Occurrence::Numeric {
                    code: code.to_string(),
                    params: strings(&["me", "#a"]),
                },
                at(),
            );
            assert!(events.is_empty());
        }
    }

    #[test]
    fn catch_all_numeric_routes_to_first_channel_param() {
        let events = mapper().map(
            Occurrence::Numeric {
                code: "482".into(),
                params: strings(&["me", "#ops", "You're not channel operator"]),
            },
            at(),
        );
        assert_eq!(
            lines(&events),
            vec![("#ops", "[15:04] me #ops You're not channel operator", true)]
        );

        let events = mapper().map(
            Occurrence::Numeric {
                code: "042".into(),
                params: strings(&["me", "ABC123", "your unique ID"]),
            },
            at(),
        );
        assert_eq!(lines(&events)[0].0, SYS_KEY);
    }

    #[test]
    fn topic_meta_formats_unix_time() {
        let events = mapper().map(
            Occurrence::TopicMeta {
                channel: "#a".into(),
                setter: "op".into(),
                set_at: "0".into(),
            },
            at(),
        );
        assert_eq!(
            lines(&events),
            vec![("#a", "— set by op @ 1970-01-01 00:00 UTC", true)]
        );
    }

    #[test]
    fn disconnect_carries_error() {
        let events = mapper().map(
            Occurrence::Disconnected {
                error: Some("refused".into()),
            },
            at(),
        );
        assert_eq!(
            events,
            vec![DomainEvent::Disconnected {
                session: SessionId::new(1),
                error: Some("refused".into())
            }]
        );
    }
}
