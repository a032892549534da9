//! Newtype wrappers for board coordinates and state keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tictactoe::Cell;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// A move target on the board, addressed as (row, col).
///
/// Actions order by row first, then column. Greedy selection relies on this
/// ordering to break ties between equally valued actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Action {
    pub row: usize,
    pub col: usize,
}

impl Action {
    /// Create a new action, validating it lies on the board.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if either coordinate is >= 3.
    pub fn new(row: usize, col: usize) -> Result<Self, crate::Error> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Action { row, col })
        } else {
            Err(crate::Error::OutOfBounds { row, col })
        }
    }

    /// Row-major cell index (0-8).
    pub fn index(self) -> usize {
        self.row * BOARD_SIZE + self.col
    }

    /// Build an action from a row-major cell index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the index is >= 9.
    pub fn from_index(index: usize) -> Result<Self, crate::Error> {
        Self::new(index / BOARD_SIZE, index % BOARD_SIZE)
    }

    /// All nine actions in row-major order.
    pub fn all() -> impl Iterator<Item = Action> {
        (0..CELL_COUNT).map(|index| Action {
            row: index / BOARD_SIZE,
            col: index % BOARD_SIZE,
        })
    }
}

impl TryFrom<(usize, usize)> for Action {
    type Error = crate::Error;

    fn try_from((row, col): (usize, usize)) -> Result<Self, Self::Error> {
        Action::new(row, col)
    }
}

impl From<Action> for (usize, usize) {
    fn from(action: Action) -> Self {
        (action.row, action.col)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Canonical serialization of a board: nine row-major symbols over `-`, `X`, `O`.
///
/// Two boards with identical cells always produce the same key. The key does
/// not record whose turn it is; that follows from the piece counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(String);

impl StateKey {
    /// Build a key from a row-major slice of cells.
    pub fn from_cells(cells: &[Cell; CELL_COUNT]) -> Self {
        StateKey(cells.iter().map(|cell| cell.to_char()).collect())
    }

    /// Parse and validate a key string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidStateKey`] unless the string is exactly
    /// nine characters drawn from `-`, `X` and `O`.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let count = s.chars().count();
        if count != CELL_COUNT {
            return Err(crate::Error::InvalidStateKey {
                key: s.to_string(),
                reason: format!("expected {CELL_COUNT} cells, got {count}"),
            });
        }
        if let Some((position, character)) = s
            .chars()
            .enumerate()
            .find(|&(_, c)| Cell::from_char(c).is_none())
        {
            return Err(crate::Error::InvalidStateKey {
                key: s.to_string(),
                reason: format!("invalid character '{character}' at position {position}"),
            });
        }
        Ok(StateKey(s.to_string()))
    }

    /// Key of the empty board.
    pub fn empty() -> Self {
        StateKey(Cell::Empty.to_char().to_string().repeat(CELL_COUNT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Content of the cell targeted by `action`.
    pub fn cell(&self, action: Action) -> Cell {
        // Keys are validated on construction, so every byte is a known symbol.
        self.0
            .as_bytes()
            .get(action.index())
            .and_then(|&b| Cell::from_char(b as char))
            .unwrap_or(Cell::Empty)
    }

    /// Whether `action` targets an empty cell in this state.
    pub fn is_legal(&self, action: Action) -> bool {
        self.cell(action) == Cell::Empty
    }

    /// All empty cells in row-major order.
    pub fn empty_actions(&self) -> Vec<Action> {
        Action::all().filter(|&a| self.is_legal(a)).collect()
    }
}

impl TryFrom<String> for StateKey {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StateKey::parse(&value)
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
