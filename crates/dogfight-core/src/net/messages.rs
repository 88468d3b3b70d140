use serde::{Deserialize, Serialize};

use crate::board::{Board, ShotOutcome};
use crate::{ConnectionId, PlayerIndex};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    CreateRoom = 0x01,
    JoinRoom = 0x02,
    SubmitPlacement = 0x03,
    Shoot = 0x04,

    // Server -> Client
    RoomCreated = 0x10,
    Error = 0x11,
    GameStart = 0x12,
    PlacementTimerStarted = 0x13,
    OpponentReady = 0x14,
    ShootingPhaseStart = 0x15,
    NewTurn = 0x16,
    ShotResult = 0x17,
    GameOver = 0x18,
    OpponentLeft = 0x19,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::CreateRoom),
            0x02 => Some(Self::JoinRoom),
            0x03 => Some(Self::SubmitPlacement),
            0x04 => Some(Self::Shoot),
            0x10 => Some(Self::RoomCreated),
            0x11 => Some(Self::Error),
            0x12 => Some(Self::GameStart),
            0x13 => Some(Self::PlacementTimerStarted),
            0x14 => Some(Self::OpponentReady),
            0x15 => Some(Self::ShootingPhaseStart),
            0x16 => Some(Self::NewTurn),
            0x17 => Some(Self::ShotResult),
            0x18 => Some(Self::GameOver),
            0x19 => Some(Self::OpponentLeft),
            _ => None,
        }
    }

    /// True for types only the server may send.
    pub fn is_server_only(self) -> bool {
        (self as u8) >= 0x10
    }
}

// ---------------------------------------------------------------------------
// Client -> Server payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomMsg {
    pub room_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPlacementMsg {
    pub room_code: String,
    pub board: Board,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootMsg {
    pub room_code: String,
    pub row: u16,
    pub col: u16,
}

// ---------------------------------------------------------------------------
// Server -> Client payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCreatedMsg {
    pub room_code: String,
}

/// Human-readable failure. There is no structured error code on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInfo {
    pub connection_id: ConnectionId,
    pub player_index: PlayerIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartMsg {
    pub players: Vec<SeatInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTimerMsg {
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTurnMsg {
    pub player_index: PlayerIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotResultMsg {
    pub shooter_index: PlayerIndex,
    pub row: u16,
    pub col: u16,
    pub result: ShotOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverMsg {
    pub winner_index: PlayerIndex,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom(JoinRoomMsg),
    SubmitPlacement(SubmitPlacementMsg),
    Shoot(ShootMsg),
}

/// Messages the server sends to one client or to a whole room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    RoomCreated(RoomCreatedMsg),
    Error(ErrorMsg),
    GameStart(GameStartMsg),
    PlacementTimerStarted(PlacementTimerMsg),
    OpponentReady,
    ShootingPhaseStart,
    NewTurn(NewTurnMsg),
    ShotResult(ShotResultMsg),
    GameOver(GameOverMsg),
    OpponentLeft,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorMsg {
            message: message.into(),
        })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::RoomCreated(_) => MessageType::RoomCreated,
            Self::Error(_) => MessageType::Error,
            Self::GameStart(_) => MessageType::GameStart,
            Self::PlacementTimerStarted(_) => MessageType::PlacementTimerStarted,
            Self::OpponentReady => MessageType::OpponentReady,
            Self::ShootingPhaseStart => MessageType::ShootingPhaseStart,
            Self::NewTurn(_) => MessageType::NewTurn,
            Self::ShotResult(_) => MessageType::ShotResult,
            Self::GameOver(_) => MessageType::GameOver,
            Self::OpponentLeft => MessageType::OpponentLeft,
        }
    }
}
