use dogfight_core::board::Board;
use dogfight_core::net::messages::{
    GameStartMsg, NewTurnMsg, PlacementTimerMsg, SeatInfo, ServerMessage,
};
use dogfight_core::room::Phase;
use dogfight_core::{ConnectionId, PlayerIndex};

use crate::error::GameError;
use crate::gateway::Gateway;
use crate::timer::PlacementTimer;

/// Seats per room.
pub const MAX_PLAYERS: usize = 2;

/// One occupant of a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub connection_id: ConnectionId,
    pub player_index: PlayerIndex,
    pub ready: bool,
    pub board: Option<Board>,
}

impl Player {
    fn new(connection_id: ConnectionId, player_index: PlayerIndex) -> Self {
        Self {
            connection_id,
            player_index,
            ready: false,
            board: None,
        }
    }
}

/// A two-player game session.
///
/// Every mutation goes through `&mut self`, and the registry hands rooms out
/// behind one mutex each, so events for the same room never interleave.
#[derive(Debug)]
pub struct Room {
    pub(crate) code: String,
    pub(crate) players: Vec<Player>,
    pub(crate) phase: Phase,
    pub(crate) current_turn: PlayerIndex,
    pub(crate) placement_timer: Option<PlacementTimer>,
    /// Set once the room has been torn down. Anyone still holding a handle
    /// to it must treat it as gone.
    pub(crate) closed: bool,
}

impl Room {
    /// Create a room with its creator seated at index 0.
    pub fn new(code: String, creator: ConnectionId) -> Self {
        Self {
            code,
            players: vec![Player::new(creator, 0)],
            phase: Phase::Waiting,
            current_turn: 0,
            placement_timer: None,
            closed: false,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_turn(&self) -> PlayerIndex {
        self.current_turn
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_timer(&self) -> bool {
        self.placement_timer.is_some()
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id == connection)
    }

    pub(crate) fn player_mut(&mut self, connection: ConnectionId) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.connection_id == connection)
    }

    /// The occupant that is not `connection`, if seated.
    pub(crate) fn opponent_mut(&mut self, connection: ConnectionId) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.connection_id != connection)
    }

    /// Seat a second player at index 1.
    pub fn seat(&mut self, connection: ConnectionId) -> Result<PlayerIndex, GameError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        let index = self.players.len() as PlayerIndex;
        self.players.push(Player::new(connection, index));
        Ok(index)
    }

    /// Move a full room from Waiting into Placing: announce the seating and
    /// arm the placement deadline.
    pub fn begin_placement(&mut self, timer: PlacementTimer, gateway: &dyn Gateway) {
        if self.phase != Phase::Waiting || self.players.len() != MAX_PLAYERS {
            return;
        }
        self.phase = Phase::Placing;
        let players = self
            .players
            .iter()
            .map(|p| SeatInfo {
                connection_id: p.connection_id,
                player_index: p.player_index,
            })
            .collect();
        gateway.broadcast(&self.code, &ServerMessage::GameStart(GameStartMsg { players }));
        gateway.broadcast(
            &self.code,
            &ServerMessage::PlacementTimerStarted(PlacementTimerMsg {
                duration_ms: timer.duration().as_millis() as u64,
            }),
        );
        self.placement_timer = Some(timer);
    }

    /// Leave Placing for Shooting. No-op in any other phase.
    pub fn start_shooting_phase(&mut self, gateway: &dyn Gateway) {
        // Disarm first so a deadline that already elapsed cannot run this again.
        if let Some(timer) = self.placement_timer.take() {
            timer.cancel();
        }
        if self.phase != Phase::Placing {
            return;
        }
        self.phase = Phase::Shooting;
        self.current_turn = 0;
        tracing::info!(room = %self.code, "Shooting phase started");
        gateway.broadcast(&self.code, &ServerMessage::ShootingPhaseStart);
        self.announce_turn(gateway);
    }

    pub(crate) fn announce_turn(&self, gateway: &dyn Gateway) {
        gateway.broadcast(
            &self.code,
            &ServerMessage::NewTurn(NewTurnMsg {
                player_index: self.current_turn,
            }),
        );
    }

    /// Release everything the room owns. The room must not be used afterwards.
    pub fn teardown(&mut self, gateway: &dyn Gateway) {
        if let Some(timer) = self.placement_timer.take() {
            timer.cancel();
        }
        self.closed = true;
        gateway.close_room(&self.code);
    }
}
