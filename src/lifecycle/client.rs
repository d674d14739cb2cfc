//! IRC connection task built on the `irc` crate
//!
//! One task per session. It owns the protocol client outright: inbound
//! messages become [`Occurrence`]s pushed through the bridge, outbound
//! requests arrive on the handle's queue. Nothing here can reach UI state.

use super::{ConnectTarget, ConnectionHandle, Connector, EventMapper, Occurrence, Outbound};
use crate::bridge::EventSender;
use anyhow::{Context, Result};
use chrono::Local;
use futures::StreamExt;
use irc::client::prelude::{Client, Command, Config, Message, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Instrument;

/// How long a closing connection may keep flushing (QUIT) before we drop it
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Spawns one tokio task per connect request
#[derive(Debug, Default, Clone, Copy)]
pub struct IrcConnector;

impl Connector for IrcConnector {
    fn connect(&self, target: ConnectTarget, bridge: EventSender) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = tracing::info_span!(
            "connection",
            session = %target.session,
            address = %target.address,
        );
        tokio::spawn(run_connection(target, rx, bridge).instrument(span));
        ConnectionHandle::new(tx)
    }
}

/// Maps occurrences and pushes the resulting events onto the bridge
struct Reporter {
    mapper: EventMapper,
    bridge: EventSender,
}

impl Reporter {
    fn emit(&self, occurrence: Occurrence) {
        for event in self.mapper.map(occurrence, Local::now().time()) {
            self.bridge.send(event);
        }
    }
}

async fn run_connection(
    target: ConnectTarget,
    mut commands: mpsc::UnboundedReceiver<Outbound>,
    bridge: EventSender,
) {
    let reporter = Reporter {
        mapper: EventMapper::new(target.session, target.address.to_string()),
        bridge,
    };

    tracing::info!(tls = target.tls, "connecting");
    let error = match drive(&target, &mut commands, &reporter).await {
        Ok(()) => {
            tracing::info!("connection closed");
            None
        }
        Err(e) => {
            tracing::warn!("connection failed: {:#}", e);
            Some(format!("{:#}", e))
        }
    };

    reporter.emit(Occurrence::Disconnected { error });
}

async fn drive(
    target: &ConnectTarget,
    commands: &mut mpsc::UnboundedReceiver<Outbound>,
    reporter: &Reporter,
) -> Result<()> {
    // Requests made before registration completes are replayed afterwards
    let mut backlog = Vec::new();

    let mut client = tokio::select! {
        client = open_client(target) => client?,
        () = wait_for_close(commands, &mut backlog) => {
            tracing::debug!("closed before the connection came up");
            return Ok(());
        }
    };

    client.identify().context("registration failed")?;
    let mut stream = client.stream().context("message stream unavailable")?;
    let mut registered = false;

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(message)) => {
                    for occurrence in translate(&message, client.current_nickname()) {
                        if occurrence == Occurrence::Connected {
                            registered = true;
                            for channel in &target.channels {
                                client.send_join(channel).context("join failed")?;
                            }
                            for command in backlog.drain(..) {
                                execute(&client, command);
                            }
                        }
                        reporter.emit(occurrence);
                    }
                }
                Some(Err(e)) => return Err(e).context("connection lost"),
                None => return Ok(()),
            },
            command = commands.recv() => match command {
                Some(Outbound::Close) | None => {
                    // Let a pending QUIT reach the server; the server ends
                    // the stream once it has it.
                    let _ = tokio::time::timeout(CLOSE_GRACE, async {
                        while let Some(Ok(_)) = stream.next().await {}
                    })
                    .await;
                    return Ok(());
                }
                Some(command) if !registered => backlog.push(command),
                Some(command) => execute(&client, command),
            },
        }
    }
}

async fn open_client(target: &ConnectTarget) -> Result<Client> {
    let config = Config {
        nickname: Some(target.nick.clone()),
        username: Some(target.nick.clone()),
        realname: Some(target.nick.clone()),
        server: Some(target.address.host.clone()),
        port: Some(target.address.port),
        use_tls: Some(target.tls),
        ..Config::default()
    };

    let pending = Client::from_config(config);
    match target.timeout {
        Some(limit) => tokio::time::timeout(limit, pending)
            .await
            .with_context(|| format!("connect timed out after {}s", limit.as_secs()))?
            .context("connect failed"),
        None => pending.await.context("connect failed"),
    }
}

/// Resolves once the handle asks for Close or is dropped
///
/// Everything else is kept in `backlog` until the server has registered us.
async fn wait_for_close(
    commands: &mut mpsc::UnboundedReceiver<Outbound>,
    backlog: &mut Vec<Outbound>,
) {
    while let Some(command) = commands.recv().await {
        if command == Outbound::Close {
            return;
        }
        backlog.push(command);
    }
}

fn execute(client: &Client, command: Outbound) {
    let sent = match &command {
        Outbound::Join(channel) => client.send_join(channel),
        Outbound::Nick(nick) => client.send(Command::NICK(nick.clone())),
        Outbound::Message { target, text } => client.send_privmsg(target, text),
        Outbound::Quit(reason) => client.send_quit(reason),
        Outbound::Close => Ok(()),
    };
    if let Err(e) = sent {
        tracing::warn!(?command, "outbound request failed: {}", e);
    }
}

/// Reduce one protocol message to the occurrences the UI cares about
fn translate(message: &Message, own_nick: &str) -> Vec<Occurrence> {
    let source = message.source_nickname().unwrap_or_default().to_string();

    match &message.command {
        Command::PRIVMSG(target, text) => match ctcp_action(text) {
            Some(action) => vec![Occurrence::Action {
                source,
                target: target.clone(),
                text: action.to_string(),
            }],
            None => vec![Occurrence::Message {
                source,
                target: target.clone(),
                text: text.clone(),
            }],
        },
        Command::NOTICE(target, text) => vec![Occurrence::Notice {
            source,
            target: target.clone(),
            text: text.clone(),
        }],
        Command::JOIN(channels, _, _) => channels
            .split(',')
            .map(|channel| Occurrence::Join {
                own: source == own_nick,
                nick: source.clone(),
                channel: channel.to_string(),
            })
            .collect(),
        Command::PART(channels, _) => channels
            .split(',')
            .map(|channel| Occurrence::Part {
                nick: source.clone(),
                channel: channel.to_string(),
            })
            .collect(),
        Command::QUIT(_) => vec![Occurrence::Quit { nick: source }],
        Command::Response(response, params) => {
            let code = format!("{:03}", *response as u16);
            let mut occurrences: Vec<Occurrence> =
                Occurrence::from_numeric(&code, params.clone()).into_iter().collect();
            if *response == Response::RPL_WELCOME {
                occurrences.push(Occurrence::Connected);
            }
            occurrences
        }
        Command::Raw(code, params) if is_numeric(code) => {
            Occurrence::from_numeric(code, params.clone()).into_iter().collect()
        }
        other => {
            tracing::trace!(?other, "unmapped message");
            Vec::new()
        }
    }
}

fn ctcp_action(text: &str) -> Option<&str> {
    text.strip_prefix("\u{1}ACTION ")
        .map(|rest| rest.trim_end_matches('\u{1}'))
}

fn is_numeric(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;
    use crate::events::{DomainEvent, SessionId};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    const WAIT: Duration = Duration::from_secs(5);

    fn parse(raw: &str) -> Message {
        raw.parse().unwrap()
    }

    fn target(port: u16) -> ConnectTarget {
        ConnectTarget {
            session: SessionId::new(1),
            address: format!("127.0.0.1:{port}").parse().unwrap(),
            tls: false,
            nick: "me".into(),
            channels: vec!["#a".into()],
            timeout: Some(WAIT),
        }
    }

    /// Event as a comparable string, line timestamps stripped
    fn describe(event: &DomainEvent) -> String {
        match event {
            DomainEvent::Line(line) => {
                let text = match line.text.strip_prefix('[') {
                    Some(rest) => rest.split_once("] ").map_or(rest, |(_, t)| t),
                    None => line.text.as_str(),
                };
                format!("{} {}", line.key(), text)
            }
            DomainEvent::Connected { .. } => "connected".into(),
            DomainEvent::Joined { channel, .. } => format!("joined {channel}"),
            DomainEvent::Disconnected { error, .. } => format!("disconnected {error:?}"),
        }
    }

    /// Registers the client, then answers its JOIN; returns every line read
    async fn serve_one(listener: TcpListener) -> Vec<String> {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut received = Vec::new();

        while let Some(line) = lines.next_line().await.unwrap() {
            let verb = line.split(' ').next().unwrap_or_default().to_string();
            received.push(line);
            match verb.as_str() {
                "USER" => write
                    .write_all(
                        b":srv 001 me :Welcome\r\n:srv 352 me #a u h srv bob H :0 Bob\r\n",
                    )
                    .await
                    .unwrap(),
                "JOIN" => write
                    .write_all(b":me!u@h JOIN #a\r\n:bob!b@h PRIVMSG #a :hi\r\n")
                    .await
                    .unwrap(),
                "QUIT" => break,
                _ => {}
            }
        }
        received
    }

    #[tokio::test]
    async fn registered_connection_joins_and_replays_queued_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(serve_one(listener));

        let (tx, mut rx) = bridge::channel();
        let handle = IrcConnector.connect(target(port), tx);
        // Not registered yet: held until the welcome
        handle.send_message("#a", "early");

        let mut events = Vec::new();
        while let Some(event) = tokio::time::timeout(WAIT, rx.recv()).await.unwrap() {
            let said_hi = describe(&event) == "#a <bob> hi";
            events.push(event);
            if said_hi {
                handle.quit("bye");
                handle.close();
            }
        }

        assert_eq!(
            events.iter().map(describe).collect::<Vec<_>>(),
            vec![
                "_sys me Welcome".to_string(),
                format!("_sys -- connected to 127.0.0.1:{port} --"),
                "connected".to_string(),
                "#a * me joined #a".to_string(),
                "joined #a".to_string(),
                "#a <bob> hi".to_string(),
                "disconnected None".to_string(),
            ]
        );

        let received = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
        let after_registration: Vec<Command> = received
            .iter()
            .map(|line| parse(line).command)
            .filter(|c| !matches!(c, Command::CAP(..) | Command::NICK(_) | Command::USER(..)))
            .collect();
        assert_eq!(
            after_registration,
            vec![
                Command::JOIN("#a".into(), None, None),
                Command::PRIVMSG("#a".into(), "early".into()),
                Command::QUIT(Some("bye".into())),
            ]
        );
    }

    #[tokio::test]
    async fn refused_connection_reports_one_disconnect() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let (tx, mut rx) = bridge::channel();
        let _handle = IrcConnector.connect(target(port), tx);

        let mut events = Vec::new();
        while let Some(event) = tokio::time::timeout(WAIT, rx.recv()).await.unwrap() {
            events.push(event);
        }

        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::Disconnected {
                session,
                error: Some(error),
            } => {
                assert_eq!(*session, SessionId::new(1));
                assert!(error.starts_with("connect failed"), "{error}");
            }
            other => panic!("expected a disconnect, got {:?}", other),
        }
    }

    #[test]
    fn privmsg_and_action() {
        let occurrences = translate(&parse(":alice!a@h PRIVMSG #rust :hello\r\n"), "me");
        assert_eq!(
            occurrences,
            vec![Occurrence::Message {
                source: "alice".into(),
                target: "#rust".into(),
                text: "hello".into()
            }]
        );

        let occurrences = translate(
            &parse(":alice!a@h PRIVMSG #rust :\u{1}ACTION waves\u{1}\r\n"),
            "me",
        );
        assert_eq!(
            occurrences,
            vec![Occurrence::Action {
                source: "alice".into(),
                target: "#rust".into(),
                text: "waves".into()
            }]
        );
    }

    #[test]
    fn own_join_is_flagged() {
        let occurrences = translate(&parse(":me!u@h JOIN #a\r\n"), "me");
        assert_eq!(
            occurrences,
            vec![Occurrence::Join {
                nick: "me".into(),
                channel: "#a".into(),
                own: true
            }]
        );
    }

    #[test]
    fn welcome_also_signals_connected() {
        let occurrences = translate(&parse(":srv 001 me :Welcome to the network\r\n"), "me");
        assert_eq!(occurrences.last(), Some(&Occurrence::Connected));
        assert!(matches!(
            occurrences.first(),
            Some(Occurrence::Informational { .. })
        ));
    }

    #[test]
    fn who_replies_are_dropped() {
        assert!(translate(&parse(":srv 352 me #a u h srv bob H :0 Bob\r\n"), "me").is_empty());
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("354"));
        assert!(!is_numeric("PING"));
        assert!(!is_numeric("b09"));
    }
}
