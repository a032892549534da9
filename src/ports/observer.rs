//! Observer port - abstraction for training observation
//!
//! Observers receive training events so that progress reporting and logging
//! stay out of the training loop itself.

use crate::{
    Result,
    tictactoe::{GameOutcome, Player},
    types::{Action, StateKey},
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_games)` - Once at the beginning
/// 2. For each game:
///    - `on_game_start(game_num)`
///    - `on_move(...)` - For each move in the game
///    - `on_game_end(game_num, outcome)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use qttt::{ports::Observer, tictactoe::GameOutcome};
///
/// struct CountingObserver {
///     game_count: usize,
/// }
///
/// impl Observer for CountingObserver {
///     fn on_game_end(&mut self, _game_num: usize, _outcome: GameOutcome) -> qttt::Result<()> {
///         self.game_count += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a game starts.
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        Ok(())
    }

    /// Called for each move, after it is applied.
    ///
    /// `state` is the key of the board the move was chosen from.
    fn on_move(
        &mut self,
        _game_num: usize,
        _state: &StateKey,
        _action: Action,
        _player: Player,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a game ends.
    fn on_game_end(&mut self, _game_num: usize, _outcome: GameOutcome) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
