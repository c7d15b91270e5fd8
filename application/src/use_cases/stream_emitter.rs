//! Stream Emitter
//!
//! The ordered, one-way event channel from a chat run to its client. A
//! closed receiver means the client went away; the run stops at its next
//! emit or await point.

use relay_domain::ChatEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Client disconnected")]
pub struct Disconnected;

#[derive(Clone)]
pub struct StreamEmitter {
    sender: mpsc::Sender<ChatEvent>,
}

impl StreamEmitter {
    pub fn new(sender: mpsc::Sender<ChatEvent>) -> Self {
        Self { sender }
    }

    /// An emitter and the receiver the transport drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    pub async fn emit(&self, event: ChatEvent) -> Result<(), Disconnected> {
        trace!(event = event.event_name(), "Emitting chat event");
        self.sender.send(event).await.map_err(|_| Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the client has gone away.
    pub async fn closed(&self) {
        self.sender.closed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (emitter, mut rx) = StreamEmitter::channel(8);
        emitter.emit(ChatEvent::text("a")).await.unwrap();
        emitter.emit(ChatEvent::text("b")).await.unwrap();
        drop(emitter);

        assert_eq!(rx.recv().await, Some(ChatEvent::text("a")));
        assert_eq!(rx.recv().await, Some(ChatEvent::text("b")));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_disconnect() {
        let (emitter, rx) = StreamEmitter::channel(1);
        drop(rx);
        assert!(emitter.is_closed());
        assert_eq!(emitter.emit(ChatEvent::text("x")).await, Err(Disconnected));
        emitter.closed().await;
    }
}
