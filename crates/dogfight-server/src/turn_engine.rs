use dogfight_core::ConnectionId;
use dogfight_core::PlayerIndex;
use dogfight_core::board::ShotOutcome;
use dogfight_core::net::messages::{GameOverMsg, ServerMessage, ShotResultMsg};
use dogfight_core::room::Phase;

use crate::error::GameError;
use crate::gateway::Gateway;
use crate::session::Room;

/// What a resolved shot did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotEffect {
    /// Play continues; the turn has passed to the other player.
    Continue(ShotOutcome),
    /// The shooter destroyed the last head. The room is Finished and must be
    /// torn down by its owner.
    GameOver { winner: PlayerIndex },
}

impl Room {
    /// Fire at the opponent's grid.
    ///
    /// Repeat shots at an already-struck cell are not deduplicated: they
    /// resolve as misses and still pass the turn.
    pub fn resolve_shot(
        &mut self,
        connection: ConnectionId,
        row: u16,
        col: u16,
        gateway: &dyn Gateway,
    ) -> Result<ShotEffect, GameError> {
        if self.phase != Phase::Shooting {
            return Err(GameError::PhaseMismatch);
        }
        let shooter = self
            .player(connection)
            .ok_or(GameError::PlayerNotFound)?
            .player_index;
        if shooter != self.current_turn {
            return Err(GameError::OutOfTurn);
        }

        let target = self
            .opponent_mut(connection)
            .and_then(|p| p.board.as_mut())
            .ok_or(GameError::NoTargetBoard)?;
        let outcome = target
            .strike(usize::from(row), usize::from(col))
            .ok_or(GameError::OutOfBounds { row, col })?;
        let heads_left = target.heads_remaining();

        gateway.broadcast(
            &self.code,
            &ServerMessage::ShotResult(ShotResultMsg {
                shooter_index: shooter,
                row,
                col,
                result: outcome,
            }),
        );

        if outcome == ShotOutcome::Destroyed && heads_left == 0 {
            self.phase = Phase::Finished;
            tracing::info!(room = %self.code, winner = shooter, "Game over");
            gateway.broadcast(
                &self.code,
                &ServerMessage::GameOver(GameOverMsg {
                    winner_index: shooter,
                }),
            );
            return Ok(ShotEffect::GameOver { winner: shooter });
        }

        self.current_turn = 1 - self.current_turn;
        self.announce_turn(gateway);
        Ok(ShotEffect::Continue(outcome))
    }
}
