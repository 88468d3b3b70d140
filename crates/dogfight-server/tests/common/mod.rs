use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use dogfight_core::board::{Board, Cell};
use dogfight_core::net::messages::{
    ClientMessage, JoinRoomMsg, ServerMessage, ShootMsg, SubmitPlacementMsg,
};
use dogfight_core::net::protocol::{decode_server_message, encode_client_message};

use dogfight_server::build_app;
use dogfight_server::config::{GameConfig, LimitsConfig, ServerConfig};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with default rules.
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Start a test server with a short placement deadline.
    pub async fn with_placement_timeout(ms: u64) -> Self {
        let config = ServerConfig {
            game: GameConfig {
                placement_timeout_ms: ms,
                ..GameConfig::default()
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    /// Start a test server that accepts at most `max` live WebSockets.
    pub async fn with_max_connections(max: usize) -> Self {
        let config = ServerConfig {
            limits: LimitsConfig {
                max_ws_connections: max,
                ..LimitsConfig::default()
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Send a ClientMessage from a WS stream.
pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read raw binary data, returning None on timeout.
pub async fn ws_try_read_raw(stream: &mut WsStream, timeout_ms: u64) -> Option<Vec<u8>> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next ServerMessage from a WebSocket stream (5s timeout).
pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Create a room and return its code.
pub async fn ws_create_room(stream: &mut WsStream) -> String {
    ws_send_client_msg(stream, &ClientMessage::CreateRoom).await;
    match ws_read_server_msg(stream).await {
        ServerMessage::RoomCreated(created) => created.room_code,
        other => panic!("Expected RoomCreated, got: {other:?}"),
    }
}

pub async fn ws_join_room(stream: &mut WsStream, room_code: &str) {
    let msg = ClientMessage::JoinRoom(JoinRoomMsg {
        room_code: room_code.to_string(),
    });
    ws_send_client_msg(stream, &msg).await;
}

pub async fn ws_submit_board(stream: &mut WsStream, room_code: &str, board: Board) {
    let msg = ClientMessage::SubmitPlacement(SubmitPlacementMsg {
        room_code: room_code.to_string(),
        board,
    });
    ws_send_client_msg(stream, &msg).await;
}

pub async fn ws_shoot(stream: &mut WsStream, room_code: &str, row: u16, col: u16) {
    let msg = ClientMessage::Shoot(ShootMsg {
        room_code: room_code.to_string(),
        row,
        col,
    });
    ws_send_client_msg(stream, &msg).await;
}

/// A 10x10 board with heads at row 0, columns 0..heads, and a body cell at (1, 0).
pub fn board_with_heads(heads: usize) -> Board {
    let mut board = Board::empty(10, 10);
    for col in 0..heads {
        board.set(0, col, Cell::Head);
    }
    board.set(1, 0, Cell::Body);
    board
}

/// Two connected players in a fresh room, past GameStart and PlacementTimerStarted.
pub async fn ws_pair(server: &TestServer) -> (WsStream, WsStream, String) {
    let mut host = ws_connect(&server.ws_url()).await;
    let code = ws_create_room(&mut host).await;
    let mut guest = ws_connect(&server.ws_url()).await;
    ws_join_room(&mut guest, &code).await;

    for stream in [&mut host, &mut guest] {
        match ws_read_server_msg(stream).await {
            ServerMessage::GameStart(start) => assert_eq!(start.players.len(), 2),
            other => panic!("Expected GameStart, got: {other:?}"),
        }
        match ws_read_server_msg(stream).await {
            ServerMessage::PlacementTimerStarted(_) => {},
            other => panic!("Expected PlacementTimerStarted, got: {other:?}"),
        }
    }
    (host, guest, code)
}
