//! Opponent port - scripted adversaries the agent trains against

use crate::{
    Result,
    tictactoe::{Game, Player},
    types::Action,
};

/// A non-learning player.
///
/// Opponents see the whole game (board and move history) and return the
/// action they want to play for `mark`.
pub trait Opponent: Send {
    /// Choose a move for `mark` in the current game.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoLegalMoves`] when the board is full.
    fn select_action(&mut self, game: &Game, mark: Player) -> Result<Action>;

    /// Name used in logs and summaries.
    fn name(&self) -> &str;

    /// Re-seed the opponent's random number generator, if it has one.
    fn set_rng_seed(&mut self, _seed: u64) {}
}
