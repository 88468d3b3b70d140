use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use dogfight_core::ConnectionId;
use dogfight_core::net::protocol::{MAX_MESSAGE_SIZE, decode_client_message, decode_message_type};

use crate::config::LimitsConfig;
use crate::state::{AppState, ConnectionGuard};

pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let Some(guard) = ConnectionGuard::try_acquire(Arc::clone(&state.ws_connection_count), max_ws)
    else {
        tracing::warn!(max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    Ok(ws
        .max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state, guard))
        .into_response())
}

/// `_guard` holds this connection's slot until the socket is gone.
async fn handle_socket(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let connection = state.allocate_connection_id();
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);
    state.hub.register(connection, tx);
    spawn_writer(ws_sender, rx);
    tracing::info!(connection_id = connection, "Client connected");

    read_loop(&mut ws_receiver, &state, connection).await;

    // Room first, so the opponent still gets OpponentLeft through the hub.
    state.rooms.disconnect(connection).await;
    state.hub.unregister(connection);
    tracing::info!(connection_id = connection, "Client disconnected");
}

/// Drains a connection's outbound channel into its socket. Ends when the
/// hub drops the sender or the socket fails.
fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Bytes>,
) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender
                .send(Message::Binary(data.to_vec().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });
}

/// Token bucket over one connection's inbound frames. Holds at most one
/// second's worth of actions.
struct ActionThrottle {
    per_sec: f64,
    available: f64,
    refilled_at: tokio::time::Instant,
    /// Frames refused since the connection opened.
    dropped: u64,
}

impl ActionThrottle {
    fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            per_sec: limits.ws_rate_limit_per_sec,
            available: limits.ws_rate_limit_per_sec,
            refilled_at: tokio::time::Instant::now(),
            dropped: 0,
        }
    }

    /// Spend one token if there is one; otherwise count the frame as dropped.
    fn admit(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let earned = now.duration_since(self.refilled_at).as_secs_f64() * self.per_sec;
        self.available = (self.available + earned).min(self.per_sec);
        self.refilled_at = now;

        if self.available < 1.0 {
            self.dropped += 1;
            return false;
        }
        self.available -= 1.0;
        true
    }
}

async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    connection: ConnectionId,
) {
    let mut throttle = ActionThrottle::from_limits(&state.config.limits);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        if !throttle.admit() {
            // Warn at 1, 2, 4, 8... drops; the rest go to debug.
            if throttle.dropped.is_power_of_two() {
                tracing::warn!(connection_id = connection, dropped = throttle.dropped, "Rate limited");
            } else {
                tracing::debug!(connection_id = connection, dropped = throttle.dropped, "Rate limited");
            }
            continue;
        }

        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            continue;
        }

        let msg_type = match decode_message_type(&data) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(connection_id = connection, error = %e, "Undecodable frame");
                continue;
            },
        };

        if msg_type.is_server_only() {
            tracing::warn!(
                connection_id = connection,
                ?msg_type,
                "Rejected server-only message from client"
            );
            continue;
        }

        match decode_client_message(&data) {
            Ok(client_msg) => state.rooms.handle(connection, client_msg).await,
            Err(e) => {
                tracing::debug!(connection_id = connection, ?msg_type, error = %e, "Malformed payload");
            },
        }
    }
}
