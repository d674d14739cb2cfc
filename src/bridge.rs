// Event bridge - connection tasks to UI consumer
//
// Many producers (one per Connecting/Connected session) push DomainEvents,
// exactly one consumer (the UI loop) drains them. The channel is unbounded:
// a producer is also servicing its socket and must never wait on the UI.
// Tokio's mpsc keeps FIFO order per sender; nothing is promised about the
// interleaving of different sessions.

use crate::events::DomainEvent;
use tokio::sync::mpsc;

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half, cloned into every connection task
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl EventSender {
    /// Push an event; never blocks
    ///
    /// Returns false if the consumer is gone (the UI has shut down), in
    /// which case the event is discarded.
    pub fn send(&self, event: impl Into<DomainEvent>) -> bool {
        let event = event.into();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                tracing::debug!(session = %event.session(), "bridge closed, event discarded");
                false
            }
        }
    }
}

/// Consumer half, owned by the UI loop
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<DomainEvent>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is dropped
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LogLine, SessionId};

    fn line(session: u64, n: usize) -> DomainEvent {
        LogLine::system(SessionId::new(session), format!("line {n}")).into()
    }

    #[tokio::test]
    async fn preserves_order_per_producer_across_tasks() {
        let (tx, mut rx) = channel();

        let mut handles = Vec::new();
        for session in 1..=3u64 {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..100 {
                    tx.send(line(session, n));
                    if n % 10 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        drop(tx);
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen: std::collections::HashMap<SessionId, Vec<String>> = Default::default();
        while let Some(event) = rx.recv().await {
            if let DomainEvent::Line(l) = event {
                seen.entry(l.session).or_default().push(l.text);
            }
        }

        assert_eq!(seen.len(), 3);
        for texts in seen.values() {
            let expected: Vec<String> = (0..100).map(|n| format!("line {n}")).collect();
            assert_eq!(texts, &expected);
        }
    }

    #[test]
    fn send_after_consumer_dropped_is_reported() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.send(line(1, 0)));
    }

    #[test]
    fn try_recv_is_empty_until_something_is_sent() {
        let (tx, mut rx) = channel();
        assert!(rx.try_recv().is_none());
        tx.send(line(1, 0));
        assert_eq!(rx.try_recv(), Some(line(1, 0)));
    }
}
