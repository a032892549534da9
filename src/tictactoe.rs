//! Tic-Tac-Toe game model

pub mod board;
pub mod game;
pub mod lines;

pub use board::{Board, Cell, Player};
pub use game::{Game, GameOutcome, GameStatus, Move};
pub use lines::{LineAnalyzer, WINNING_LINES};
