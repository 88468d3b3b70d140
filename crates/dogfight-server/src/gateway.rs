use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use tokio::sync::mpsc;

use dogfight_core::ConnectionId;
use dogfight_core::net::messages::ServerMessage;
use dogfight_core::net::protocol::encode_server_message;

/// Per-connection sender for outbound WebSocket binary frames.
/// Bounded so a slow client cannot exhaust memory; `Bytes` makes
/// room broadcasts zero-copy.
pub type PlayerSender = mpsc::Sender<Bytes>;

/// Outbound delivery capabilities the game core relies on. The core never
/// touches sockets; it addresses connections and room channels.
pub trait Gateway: Send + Sync {
    /// Deliver to a single connection.
    fn send_to(&self, connection: ConnectionId, msg: &ServerMessage);
    /// Add a connection to a room's broadcast channel.
    fn subscribe(&self, room_code: &str, connection: ConnectionId);
    /// Deliver to every connection subscribed to the room.
    fn broadcast(&self, room_code: &str, msg: &ServerMessage);
    /// Forget a room's broadcast channel.
    fn close_room(&self, room_code: &str);
}

#[derive(Default)]
struct HubInner {
    connections: HashMap<ConnectionId, PlayerSender>,
    channels: HashMap<String, Vec<ConnectionId>>,
}

/// Production [`Gateway`]: live connection senders plus room membership.
#[derive(Default)]
pub struct ConnectionHub {
    inner: RwLock<HubInner>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: ConnectionId, sender: PlayerSender) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.connections.insert(connection, sender);
    }

    /// Drop a connection's sender and every channel membership it holds.
    pub fn unregister(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.connections.remove(&connection);
        for members in inner.channels.values_mut() {
            members.retain(|&c| c != connection);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connections
            .len()
    }

    fn encode(msg: &ServerMessage) -> Option<Bytes> {
        match encode_server_message(msg) {
            Ok(data) => Some(Bytes::from(data)),
            Err(e) => {
                tracing::warn!(error = %e, msg_type = ?msg.message_type(), "Failed to encode message");
                None
            },
        }
    }
}

impl Gateway for ConnectionHub {
    fn send_to(&self, connection: ConnectionId, msg: &ServerMessage) {
        let Some(bytes) = Self::encode(msg) else {
            return;
        };
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = inner.connections.get(&connection)
            && let Err(e) = sender.try_send(bytes)
        {
            tracing::debug!(
                connection_id = connection, error = %e,
                "Failed to send to connection (slow or disconnected)"
            );
        }
    }

    fn subscribe(&self, room_code: &str, connection: ConnectionId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let members = inner.channels.entry(room_code.to_string()).or_default();
        if !members.contains(&connection) {
            members.push(connection);
        }
    }

    fn broadcast(&self, room_code: &str, msg: &ServerMessage) {
        let Some(bytes) = Self::encode(msg) else {
            return;
        };
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let Some(members) = inner.channels.get(room_code) else {
            return;
        };
        for connection in members {
            if let Some(sender) = inner.connections.get(connection)
                && let Err(e) = sender.try_send(bytes.clone())
            {
                tracing::debug!(
                    connection_id = connection, room = room_code, error = %e,
                    "Skipping broadcast to slow client"
                );
            }
        }
    }

    fn close_room(&self, room_code: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.channels.remove(room_code);
    }
}
