//! Board representation and basic operations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lines::LineAnalyzer;
use crate::types::{Action, BOARD_SIZE, CELL_COUNT, StateKey};

/// A cell on the Tic-Tac-Toe board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '-',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '-' => Some(Cell::Empty),
            'X' => Some(Cell::X),
            'O' => Some(Cell::O),
            _ => None,
        }
    }

    /// Convert cell to the player occupying it, if any
    pub fn to_player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }
}

/// A player's mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell().to_char())
    }
}

/// A 3x3 grid of cells stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Build a board from raw row-major cells.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Board { cells }
    }

    /// Rebuild the board a state key was taken from.
    pub fn from_key(key: &StateKey) -> Self {
        let mut cells = [Cell::Empty; CELL_COUNT];
        for action in Action::all() {
            cells[action.index()] = key.cell(action);
        }
        Board { cells }
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Get the cell at (row, col)
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] for coordinates off the board.
    pub fn get(&self, row: usize, col: usize) -> Result<Cell, crate::Error> {
        Ok(self.cells[Action::new(row, col)?.index()])
    }

    pub fn cell(&self, action: Action) -> Cell {
        self.cells[action.index()]
    }

    /// Place `player`'s mark on an empty cell.
    ///
    /// The board is left untouched when the move fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::IllegalMove`].
    pub fn place(&mut self, row: usize, col: usize, player: Player) -> Result<(), crate::Error> {
        let action = Action::new(row, col)?;
        if self.cell(action) != Cell::Empty {
            return Err(crate::Error::IllegalMove { row, col });
        }
        self.cells[action.index()] = player.to_cell();
        Ok(())
    }

    /// All empty cells in row-major order
    pub fn empty_actions(&self) -> Vec<Action> {
        Action::all()
            .filter(|&action| self.cell(action) == Cell::Empty)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        !self.cells.contains(&Cell::Empty)
    }

    /// Check if a player has three in a row
    pub fn has_won(&self, player: Player) -> bool {
        LineAnalyzer::has_won(&self.cells, player)
    }

    /// Get the winner if there is one
    pub fn winner(&self) -> Option<Player> {
        if self.has_won(Player::X) {
            Some(Player::X)
        } else if self.has_won(Player::O) {
            Some(Player::O)
        } else {
            None
        }
    }

    /// Full board without a winning line
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }

    pub fn state_key(&self) -> StateKey {
        StateKey::from_cells(&self.cells)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(BOARD_SIZE).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = chunk.iter().map(|c| c.to_char().to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_get() {
        let mut board = Board::new();
        board.place(1, 2, Player::O).unwrap();
        assert_eq!(board.get(1, 2).unwrap(), Cell::O);
        assert_eq!(board.empty_actions().len(), 8);
    }

    #[test]
    fn test_place_on_occupied_fails() {
        let mut board = Board::new();
        board.place(0, 0, Player::X).unwrap();
        let before = board;
        assert!(matches!(
            board.place(0, 0, Player::O),
            Err(crate::Error::IllegalMove { row: 0, col: 0 })
        ));
        assert_eq!(board, before);
    }

    #[test]
    fn test_key_roundtrip() {
        let mut board = Board::new();
        board.place(0, 1, Player::X).unwrap();
        board.place(2, 2, Player::O).unwrap();
        let key = board.state_key();
        assert_eq!(key.as_str(), "-X------O");
        assert_eq!(Board::from_key(&key), board);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.place(1, 1, Player::X).unwrap();
        assert_eq!(board.to_string(), "- - -\n- X -\n- - -");
    }
}
