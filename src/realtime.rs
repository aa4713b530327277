//! Change notification fan-out.
//!
//! Every successful mutation on a gated resource broadcasts a named event
//! to all currently-connected websocket clients, which treat it purely as
//! a refetch trigger. Delivery is best-effort and at-most-once: there is
//! no replay, no queue, and a client connecting after a broadcast misses
//! it. Correctness never depends on these events; clients can always
//! refetch on their own.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// The resource collections a change event can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Products,
    Users,
}

impl ResourceKind {
    pub fn event_name(&self) -> &'static str {
        match self {
            ResourceKind::Products => "server:products_updated",
            ResourceKind::Users => "server:users_updated",
        }
    }
}

/// Wire frame for a change event. No payload beyond the event name;
/// receipt only means "refetch this collection".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event: String,
}

impl ChangeEvent {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            event: kind.event_name().to_string(),
        }
    }
}

/// Process-wide broadcaster over the registry of connected listeners.
///
/// Cloning shares the underlying channel; the notifier is constructed once
/// at startup and injected, never reached through a global.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ResourceKind>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Announce that a resource collection changed. A send error only
    /// means nobody is listening, which is fine.
    pub fn notify(&self, kind: ResourceKind) {
        let listeners = self.tx.send(kind).unwrap_or(0);
        debug!(event = kind.event_name(), listeners, "Broadcast change event");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceKind> {
        self.tx.subscribe()
    }
}

/// GET /ws - upgrade and stream change events to the client.
pub async fn ws_handler(ws: WebSocketUpgrade, State(notifier): State<ChangeNotifier>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, notifier))
}

async fn handle_socket(mut socket: WebSocket, notifier: ChangeNotifier) {
    let mut rx = notifier.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let kind = match event {
                    Ok(kind) => kind,
                    // Lagged: missed events are dropped by contract.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let frame = serde_json::to_string(&ChangeEvent::new(kind))
                    .unwrap_or_else(|_| "{}".to_string());
                if socket.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text == "ping" => {
                        let _ = socket.send(Message::Text("pong".to_string())).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(ResourceKind::Products.event_name(), "server:products_updated");
        assert_eq!(ResourceKind::Users.event_name(), "server:users_updated");
    }

    #[test]
    fn test_change_event_wire_shape() {
        let frame = serde_json::to_string(&ChangeEvent::new(ResourceKind::Products)).unwrap();
        assert_eq!(frame, r#"{"event":"server:products_updated"}"#);
    }

    #[tokio::test]
    async fn test_subscribers_receive_notifications() {
        let notifier = ChangeNotifier::new(16);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.notify(ResourceKind::Products);
        notifier.notify(ResourceKind::Users);

        assert_eq!(a.recv().await.unwrap(), ResourceKind::Products);
        assert_eq!(a.recv().await.unwrap(), ResourceKind::Users);
        assert_eq!(b.recv().await.unwrap(), ResourceKind::Products);
        assert_eq!(b.recv().await.unwrap(), ResourceKind::Users);
    }

    #[test]
    fn test_notify_without_listeners_is_fine() {
        let notifier = ChangeNotifier::new(16);
        notifier.notify(ResourceKind::Products);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let notifier = ChangeNotifier::new(16);
        notifier.notify(ResourceKind::Products);

        let mut late = notifier.subscribe();
        notifier.notify(ResourceKind::Users);

        // Only the event sent after subscribing arrives.
        assert_eq!(late.recv().await.unwrap(), ResourceKind::Users);
        assert!(late.try_recv().is_err());
    }
}
