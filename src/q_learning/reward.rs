//! Reward convention shared by every TD update.
//!
//! | Transition                        | Reward |
//! |-----------------------------------|--------|
//! | terminal, agent's own mark won    | `+1.0` |
//! | terminal, agent's opponent won    | `-1.0` |
//! | terminal, draw                    | `0.0`  |
//! | non-terminal                      | `0.0`  |

use crate::tictactoe::{GameOutcome, Player};

pub const WIN_REWARD: f64 = 1.0;
pub const LOSS_REWARD: f64 = -1.0;
pub const DRAW_REWARD: f64 = 0.0;
pub const STEP_REWARD: f64 = 0.0;

/// Reward for the transition that ended the game, seen from `role`.
pub fn terminal_reward(outcome: GameOutcome, role: Player) -> f64 {
    match outcome {
        GameOutcome::Win(winner) if winner == role => WIN_REWARD,
        GameOutcome::Win(_) => LOSS_REWARD,
        GameOutcome::Draw => DRAW_REWARD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_rewards() {
        assert_eq!(terminal_reward(GameOutcome::Win(Player::O), Player::O), 1.0);
        assert_eq!(terminal_reward(GameOutcome::Win(Player::X), Player::O), -1.0);
        assert_eq!(terminal_reward(GameOutcome::Draw, Player::X), 0.0);
        assert_eq!(STEP_REWARD, 0.0);
    }
}
