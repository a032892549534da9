//! A single match: board ownership and terminal adjudication

use std::fmt;

use super::board::{Board, Player};
use crate::types::{Action, StateKey};

/// A move in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub action: Action,
    pub player: Player,
}

/// Outcome of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

impl GameOutcome {
    /// Swap the winner perspective (X <-> O).
    pub fn swap_players(self) -> Self {
        match self {
            GameOutcome::Win(player) => GameOutcome::Win(player.opponent()),
            GameOutcome::Draw => GameOutcome::Draw,
        }
    }
}

/// Lifecycle of a game. Terminal states admit no further moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// One played match.
///
/// Owns a fresh [`Board`] and records the moves applied to it. Once the game
/// reaches a terminal status the front end is expected to discard it and start
/// a new one.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    moves: Vec<Move>,
    status: GameStatus,
}

impl Game {
    /// Create a new game on an empty board
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            moves: Vec::new(),
            status: GameStatus::InProgress,
        }
    }

    /// Current cell grid
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Moves applied so far, in order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Final outcome, once the game is terminal
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.status {
            GameStatus::InProgress => None,
            GameStatus::Won(player) => Some(GameOutcome::Win(player)),
            GameStatus::Draw => Some(GameOutcome::Draw),
        }
    }

    /// Place `mark` at (row, col).
    ///
    /// Turn order is not enforced here; the caller decides who moves.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::GameOver`] once the game is terminal
    /// - [`crate::Error::OutOfBounds`] for coordinates off the board
    /// - [`crate::Error::IllegalMove`] when the cell is occupied
    ///
    /// The board is unchanged on every error.
    pub fn apply_move(
        &mut self,
        row: usize,
        col: usize,
        mark: Player,
    ) -> Result<(), crate::Error> {
        if self.status.is_terminal() {
            return Err(crate::Error::GameOver);
        }

        self.board.place(row, col, mark)?;
        self.moves.push(Move {
            action: Action { row, col },
            player: mark,
        });

        // Win is checked before draw so a board completed by a winning move
        // is never reported as drawn.
        self.status = if self.check_win(mark) {
            GameStatus::Won(mark)
        } else if self.check_draw() {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        };

        Ok(())
    }

    /// Apply a move expressed as an [`Action`]
    pub fn play(&mut self, action: Action, mark: Player) -> Result<(), crate::Error> {
        self.apply_move(action.row, action.col, mark)
    }

    /// All empty cells, row-major. Empty once the board is full.
    pub fn legal_actions(&self) -> Vec<Action> {
        self.board.empty_actions()
    }

    /// True iff one of the eight lines is entirely `mark`
    pub fn check_win(&self, mark: Player) -> bool {
        self.board.has_won(mark)
    }

    /// True iff the board is full and neither mark has won
    pub fn check_draw(&self) -> bool {
        self.legal_actions().is_empty()
            && !self.check_win(Player::X)
            && !self.check_win(Player::O)
    }

    /// Canonical key of the current board
    pub fn state_key(&self) -> StateKey {
        self.board.state_key()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(game: &mut Game, moves: &[(usize, usize, Player)]) {
        for &(row, col, player) in moves {
            game.apply_move(row, col, player).unwrap();
        }
    }

    #[test]
    fn test_new_game_in_progress() {
        let game = Game::new();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.legal_actions().len(), 9);
        assert_eq!(game.state_key(), StateKey::empty());
        assert!(game.outcome().is_none());
    }

    #[test]
    fn test_win_sets_status() {
        let mut game = Game::new();
        play_all(
            &mut game,
            &[
                (0, 0, Player::X),
                (1, 0, Player::O),
                (0, 1, Player::X),
                (1, 1, Player::O),
                (0, 2, Player::X),
            ],
        );
        assert_eq!(game.status(), GameStatus::Won(Player::X));
        assert_eq!(game.outcome(), Some(GameOutcome::Win(Player::X)));
        assert!(matches!(
            game.apply_move(2, 2, Player::O),
            Err(crate::Error::GameOver)
        ));
    }

    #[test]
    fn test_winning_last_move_is_not_a_draw() {
        // X O X
        // O X O
        // O X X  <- X fills the last cell and completes the main diagonal
        let mut game = Game::new();
        play_all(
            &mut game,
            &[
                (0, 0, Player::X),
                (0, 1, Player::O),
                (0, 2, Player::X),
                (1, 0, Player::O),
                (1, 1, Player::X),
                (1, 2, Player::O),
                (2, 1, Player::X),
                (2, 0, Player::O),
            ],
        );
        assert_eq!(game.status(), GameStatus::InProgress);
        game.apply_move(2, 2, Player::X).unwrap();
        assert!(game.legal_actions().is_empty());
        assert_eq!(game.status(), GameStatus::Won(Player::X));
        assert!(!game.check_draw());
    }

    #[test]
    fn test_draw() {
        // X O X
        // X O O
        // O X X
        let mut game = Game::new();
        play_all(
            &mut game,
            &[
                (0, 0, Player::X),
                (0, 1, Player::O),
                (0, 2, Player::X),
                (1, 1, Player::O),
                (1, 0, Player::X),
                (1, 2, Player::O),
                (2, 1, Player::X),
                (2, 0, Player::O),
                (2, 2, Player::X),
            ],
        );
        assert_eq!(game.status(), GameStatus::Draw);
        assert_eq!(game.outcome(), Some(GameOutcome::Draw));
        assert!(game.check_draw());
        assert!(!game.check_win(Player::X));
        assert!(!game.check_win(Player::O));
        assert_eq!(game.moves().len(), 9);
    }

    #[test]
    fn test_illegal_move_leaves_board_unchanged() {
        let mut game = Game::new();
        game.apply_move(1, 1, Player::X).unwrap();
        let before = *game.board();
        assert!(matches!(
            game.apply_move(1, 1, Player::O),
            Err(crate::Error::IllegalMove { row: 1, col: 1 })
        ));
        assert_eq!(*game.board(), before);
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut game = Game::new();
        assert!(matches!(
            game.apply_move(0, 3, Player::X),
            Err(crate::Error::OutOfBounds { row: 0, col: 3 })
        ));
        assert_eq!(game.legal_actions().len(), 9);
    }
}
