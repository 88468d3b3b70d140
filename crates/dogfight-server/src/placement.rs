use dogfight_core::ConnectionId;
use dogfight_core::board::Board;
use dogfight_core::net::messages::ServerMessage;
use dogfight_core::room::Phase;

use crate::error::GameError;
use crate::gateway::Gateway;
use crate::session::{MAX_PLAYERS, Room};

/// Placement rules for a submitted board.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator {
    pub required_heads: usize,
}

impl PlacementValidator {
    pub fn new(required_heads: usize) -> Self {
        Self { required_heads }
    }

    /// Only the head count is checked; body cells and grid size are free.
    pub fn validate(&self, board: &Board) -> Result<(), GameError> {
        let heads = board.heads_remaining();
        if heads != self.required_heads {
            return Err(GameError::InvalidPlacement {
                heads,
                required: self.required_heads,
            });
        }
        Ok(())
    }
}

impl Room {
    /// Accept a player's hidden board. Once both players are ready the room
    /// moves straight to shooting, whatever time is left on the deadline.
    pub fn submit_placement(
        &mut self,
        connection: ConnectionId,
        board: Board,
        validator: &PlacementValidator,
        gateway: &dyn Gateway,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Placing {
            return Err(GameError::PhaseMismatch);
        }
        let player = self
            .player_mut(connection)
            .ok_or(GameError::PlayerNotFound)?;
        // A submitted board is final.
        if player.ready {
            return Err(GameError::PhaseMismatch);
        }
        validator.validate(&board)?;

        player.board = Some(board);
        player.ready = true;
        let player_index = player.player_index;
        tracing::info!(room = %self.code, player_index, "Placement accepted");

        if let Some(opponent) = self.opponent_mut(connection) {
            gateway.send_to(opponent.connection_id, &ServerMessage::OpponentReady);
        }

        let all_ready =
            self.players.len() == MAX_PLAYERS && self.players.iter().all(|p| p.ready);
        if all_ready {
            self.start_shooting_phase(gateway);
        }
        Ok(())
    }
}
