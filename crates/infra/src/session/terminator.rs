use async_trait::async_trait;
use nexium_core::SessionTerminator;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 16;

/// Application-visible session lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session ended; the user must sign in again
    Terminated,
}

/// [`SessionTerminator`] that publishes [`SessionEvent::Terminated`] to every
/// subscriber.
///
/// Subscribers typically reset UI login state. Publishing with no
/// subscribers is not an error.
#[derive(Clone)]
pub struct BroadcastSessionTerminator {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastSessionTerminator {
    /// Terminator with no subscribers yet
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Receiver for events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSessionTerminator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionTerminator for BroadcastSessionTerminator {
    async fn logout(&self) {
        info!("session terminated; signaling logout");
        match self.sender.send(SessionEvent::Terminated) {
            Ok(receivers) => debug!(receivers, "logout delivered"),
            Err(_) => debug!("logout signaled with no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let terminator = BroadcastSessionTerminator::new();
        let mut first = terminator.subscribe();
        let mut second = terminator.subscribe();

        terminator.logout().await;

        assert_eq!(first.recv().await.unwrap(), SessionEvent::Terminated);
        assert_eq!(second.recv().await.unwrap(), SessionEvent::Terminated);
    }

    #[tokio::test]
    async fn logout_without_subscribers_is_fine() {
        BroadcastSessionTerminator::new().logout().await;
    }

    #[test]
    fn event_wire_format() {
        let value = serde_json::to_value(SessionEvent::Terminated).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "terminated" }));
    }
}
