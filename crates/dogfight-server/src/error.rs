use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why a player action was refused.
///
/// Only some variants are reported back to the player (see
/// [`GameError::is_surfaced`]); the rest are dropped without feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    RoomNotFound,
    RoomFull,
    PlayerNotFound,
    InvalidPlacement { heads: usize, required: usize },
    OutOfTurn,
    PhaseMismatch,
    StaleRoom,
    /// Shot targets an opponent that never submitted a board.
    NoTargetBoard,
    OutOfBounds { row: u16, col: u16 },
    /// Connection already occupies a seat in some room.
    AlreadySeated,
    /// Every random draw collided with an active room.
    NoFreeRoomCode,
}

impl GameError {
    /// Whether the originating connection receives an `Error` frame.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound
                | Self::RoomFull
                | Self::InvalidPlacement { .. }
                | Self::AlreadySeated
                | Self::NoFreeRoomCode
        )
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound => write!(f, "Room does not exist."),
            Self::RoomFull => write!(f, "Room is full."),
            Self::PlayerNotFound => write!(f, "player is not seated in this room"),
            Self::InvalidPlacement { heads, required } => write!(
                f,
                "Invalid placement: {heads} plane heads placed, exactly {required} required."
            ),
            Self::OutOfTurn => write!(f, "not this player's turn"),
            Self::PhaseMismatch => write!(f, "action not valid in the current phase"),
            Self::StaleRoom => write!(f, "room no longer exists"),
            Self::NoTargetBoard => write!(f, "opponent has no board"),
            Self::OutOfBounds { row, col } => write!(f, "cell ({row}, {col}) is off the grid"),
            Self::AlreadySeated => write!(f, "You are already in a room."),
            Self::NoFreeRoomCode => write!(f, "Could not allocate a room code, try again."),
        }
    }
}

impl std::error::Error for GameError {}

/// Errors returned by the HTTP routes.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) => write!(f, "{m}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
