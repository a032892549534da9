//! Tabular TD learning for tic-tac-toe
//!
//! This crate provides:
//! - A tic-tac-toe game model with win/draw adjudication and state keys
//! - Q-learning and SARSA agents sharing one epsilon-greedy value table
//! - MessagePack persistence behind a repository port
//! - A training pipeline against scripted opponents, with observers
//! - The `qttt` command-line front end

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod tictactoe;
pub mod types;

pub use error::{Error, Result};
pub use q_learning::{TdAgent, TdAlgorithm};
pub use tictactoe::{Game, GameOutcome, Player};
pub use types::{Action, StateKey};
