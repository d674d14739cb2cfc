// Server list rows
//
// The left pane is a flat list: for each session its system row, then one
// row per desired channel, and a trailing "add" placeholder.

use crate::events::SessionId;
use crate::session::SessionRegistry;

/// One entry in the server list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRow {
    /// A session's system log (`channel: None`) or one of its channels
    Session {
        session: SessionId,
        channel: Option<String>,
    },
    /// The "+ Add New Server" entry
    AddPlaceholder,
}

impl ListRow {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            ListRow::Session { session, .. } => Some(*session),
            ListRow::AddPlaceholder => None,
        }
    }
}

/// Rows in display order, placeholder last
pub fn build_rows(registry: &SessionRegistry) -> Vec<ListRow> {
    let mut rows = Vec::new();
    for session in registry.iter() {
        rows.push(ListRow::Session {
            session: session.id,
            channel: None,
        });
        rows.extend(session.channels.iter().map(|channel| ListRow::Session {
            session: session.id,
            channel: Some(channel.clone()),
        }));
    }
    rows.push(ListRow::AddPlaceholder);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;

    #[test]
    fn empty_registry_has_only_placeholder() {
        let registry = SessionRegistry::new("bye");
        assert_eq!(build_rows(&registry), vec![ListRow::AddPlaceholder]);
    }

    #[test]
    fn sessions_expand_into_system_and_channel_rows() {
        let mut registry = SessionRegistry::new("bye");
        let id = registry.create(SessionConfig {
            name: "net1".into(),
            address: "irc.example:6697".parse().unwrap(),
            tls: false,
            nick: "zuse".into(),
            channels: vec!["#a".into(), "#b".into()],
        });

        let rows = build_rows(&registry);
        assert_eq!(
            rows,
            vec![
                ListRow::Session {
                    session: id,
                    channel: None
                },
                ListRow::Session {
                    session: id,
                    channel: Some("#a".into())
                },
                ListRow::Session {
                    session: id,
                    channel: Some("#b".into())
                },
                ListRow::AddPlaceholder,
            ]
        );
        assert_eq!(rows[1].session(), Some(id));
        assert_eq!(rows[3].session(), None);
    }
}
