use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use dogfight_core::ConnectionId;
use dogfight_core::board::Board;
use dogfight_core::net::messages::{ClientMessage, RoomCreatedMsg, ServerMessage};
use dogfight_core::room::{Phase, generate_room_code, is_valid_room_code, normalize_room_code};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::gateway::Gateway;
use crate::placement::PlacementValidator;
use crate::session::Room;
use crate::timer::PlacementTimer;
use crate::turn_engine::ShotEffect;

/// A room behind its own lock. Events for one room are serialized here.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Public snapshot of a room, for the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStatus {
    pub code: String,
    pub phase: Phase,
    pub players: usize,
}

/// Owns every active room and routes player actions to them.
///
/// Lock order is room first, then the `rooms`/`seats` maps. The maps are never
/// held while waiting on a room lock.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    /// connection → code of the room it sits in.
    seats: RwLock<HashMap<ConnectionId, String>>,
    gateway: Arc<dyn Gateway>,
    config: GameConfig,
    validator: PlacementValidator,
}

impl RoomRegistry {
    pub fn new(gateway: Arc<dyn Gateway>, config: GameConfig) -> Self {
        let validator = PlacementValidator::new(config.required_heads);
        Self {
            rooms: RwLock::new(HashMap::new()),
            seats: RwLock::new(HashMap::new()),
            gateway,
            config,
            validator,
        }
    }

    /// Dispatch one inbound action. Failures the player should hear about are
    /// sent back as an `Error` frame; everything else is dropped.
    pub async fn handle(self: &Arc<Self>, connection: ConnectionId, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::CreateRoom => self.create_room(connection).await.map(|_| ()),
            ClientMessage::JoinRoom(m) => self.join_room(&m.room_code, connection).await,
            ClientMessage::SubmitPlacement(m) => {
                self.submit_placement(&m.room_code, connection, m.board)
                    .await
            },
            ClientMessage::Shoot(m) => self
                .shoot(&m.room_code, connection, m.row, m.col)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            self.report(connection, &e);
        }
    }

    fn report(&self, connection: ConnectionId, err: &GameError) {
        if err.is_surfaced() {
            tracing::info!(connection_id = connection, error = %err, "Action refused");
            self.gateway
                .send_to(connection, &ServerMessage::error(err.to_string()));
        } else {
            tracing::debug!(connection_id = connection, error = %err, "Action dropped");
        }
    }

    /// Open a new room with `connection` at seat 0. Only the creator is told.
    pub async fn create_room(&self, connection: ConnectionId) -> Result<String, GameError> {
        if self.seats.read().await.contains_key(&connection) {
            return Err(GameError::AlreadySeated);
        }
        let code = {
            let mut rooms = self.rooms.write().await;
            let code = allocate_code(
                &mut rand::rng(),
                |c| rooms.contains_key(c),
                self.config.room_code_attempts,
            )
            .ok_or(GameError::NoFreeRoomCode)?;
            let room = Room::new(code.clone(), connection);
            rooms.insert(code.clone(), Arc::new(Mutex::new(room)));
            code
        };
        self.seats.write().await.insert(connection, code.clone());
        self.gateway.subscribe(&code, connection);
        self.gateway.send_to(
            connection,
            &ServerMessage::RoomCreated(RoomCreatedMsg {
                room_code: code.clone(),
            }),
        );
        tracing::info!(room = %code, connection_id = connection, "Room created");
        Ok(code)
    }

    /// Seat `connection` as the second player and start the placement phase.
    pub async fn join_room(
        self: &Arc<Self>,
        code: &str,
        connection: ConnectionId,
    ) -> Result<(), GameError> {
        if self.seats.read().await.contains_key(&connection) {
            return Err(GameError::AlreadySeated);
        }
        let code = normalize_room_code(code);
        if !is_valid_room_code(&code) {
            return Err(GameError::RoomNotFound);
        }
        let shared = self.lookup(&code).await.ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;
        if room.is_closed() {
            return Err(GameError::RoomNotFound);
        }
        let player_index = room.seat(connection)?;
        self.seats.write().await.insert(connection, code.clone());
        self.gateway.subscribe(&code, connection);
        tracing::info!(room = %code, connection_id = connection, player_index, "Player joined");

        let registry = Arc::downgrade(self);
        let timer_code = code.clone();
        let timer = PlacementTimer::schedule(
            self.config.placement_timeout(),
            move |token| async move {
                if let Some(registry) = registry.upgrade() {
                    registry.expire_placement(&timer_code, &token).await;
                }
            },
        );
        room.begin_placement(timer, self.gateway.as_ref());
        Ok(())
    }

    pub async fn submit_placement(
        &self,
        code: &str,
        connection: ConnectionId,
        board: Board,
    ) -> Result<(), GameError> {
        let shared = self.resolve(code).await?;
        let mut room = shared.lock().await;
        if room.is_closed() {
            return Err(GameError::StaleRoom);
        }
        room.submit_placement(connection, board, &self.validator, self.gateway.as_ref())
    }

    pub async fn shoot(
        &self,
        code: &str,
        connection: ConnectionId,
        row: u16,
        col: u16,
    ) -> Result<ShotEffect, GameError> {
        let shared = self.resolve(code).await?;
        let mut room = shared.lock().await;
        if room.is_closed() {
            return Err(GameError::StaleRoom);
        }
        let effect = room.resolve_shot(connection, row, col, self.gateway.as_ref())?;
        if let ShotEffect::GameOver { .. } = effect {
            self.destroy(&mut room).await;
        }
        Ok(effect)
    }

    /// Placement deadline callback. Does nothing if the timer was cancelled
    /// or the room has already moved on.
    pub async fn expire_placement(&self, code: &str, token: &CancellationToken) {
        let Some(shared) = self.lookup(code).await else {
            return;
        };
        let mut room = shared.lock().await;
        if room.is_closed() || token.is_cancelled() {
            tracing::debug!(room = code, "Stale placement deadline ignored");
            return;
        }
        tracing::info!(room = code, "Placement deadline reached");
        room.start_shooting_phase(self.gateway.as_ref());
    }

    /// A connection went away. Its room, if any, ends for everyone.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let Some(code) = self.seats.write().await.remove(&connection) else {
            return;
        };
        let Some(shared) = self.lookup(&code).await else {
            return;
        };
        let mut room = shared.lock().await;
        if room.is_closed() {
            return;
        }
        // Sent even when nobody else is seated yet.
        self.gateway.broadcast(&code, &ServerMessage::OpponentLeft);
        tracing::info!(
            room = %code,
            connection_id = connection,
            phase = ?room.phase(),
            "Player disconnected, closing room"
        );
        self.destroy(&mut room).await;
    }

    /// Tear down a room by code. Safe to call for rooms that are already gone.
    pub async fn remove_room(&self, code: &str) {
        let Some(shared) = self.lookup(code).await else {
            return;
        };
        let mut room = shared.lock().await;
        if !room.is_closed() {
            self.destroy(&mut room).await;
        }
    }

    /// Cancel the timer, close the channel, and forget the room and its seats.
    /// Caller holds the room lock.
    async fn destroy(&self, room: &mut Room) {
        room.teardown(self.gateway.as_ref());
        self.rooms.write().await.remove(room.code());
        let mut seats = self.seats.write().await;
        for player in room.players() {
            if seats.get(&player.connection_id).map(String::as_str) == Some(room.code()) {
                seats.remove(&player.connection_id);
            }
        }
        tracing::info!(room = %room.code(), "Room destroyed");
    }

    async fn lookup(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(code).map(Arc::clone)
    }

    /// Lookup for in-game actions, where a missing room is a silent no-op.
    async fn resolve(&self, code: &str) -> Result<SharedRoom, GameError> {
        let code = normalize_room_code(code);
        self.lookup(&code).await.ok_or(GameError::StaleRoom)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn seated_count(&self) -> usize {
        self.seats.read().await.len()
    }

    pub async fn room_status(&self, code: &str) -> Option<RoomStatus> {
        let shared = self.lookup(&normalize_room_code(code)).await?;
        let room = shared.lock().await;
        if room.is_closed() {
            return None;
        }
        Some(RoomStatus {
            code: room.code().to_string(),
            phase: room.phase(),
            players: room.players().len(),
        })
    }
}

/// Draw random codes until one is free, giving up after `attempts` draws.
fn allocate_code<R: Rng + ?Sized>(
    rng: &mut R,
    taken: impl Fn(&str) -> bool,
    attempts: u32,
) -> Option<String> {
    (0..attempts)
        .map(|_| generate_room_code(rng))
        .find(|code| !taken(code))
}
