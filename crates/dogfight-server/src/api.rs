use axum::Json;
use axum::extract::{Path, State};

use dogfight_core::room::{is_valid_room_code, normalize_room_code};

use crate::error::AppError;
use crate::room_registry::RoomStatus;
use crate::state::AppState;

/// `GET /api/v1/rooms/{code}`: phase and occupancy of an active room.
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomStatus>, AppError> {
    let code = normalize_room_code(&code);
    if !is_valid_room_code(&code) {
        return Err(AppError::BadRequest(format!("Invalid room code: {code}")));
    }
    state
        .rooms
        .room_status(&code)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Room {code} not found")))
}
