//! Ports (trait boundaries) for external dependencies.
//!
//! The learning core owns these traits; storage backends, scripted opponents
//! and training observers implement them.

pub mod observer;
pub mod opponent;
pub mod repository;

pub use observer::Observer;
pub use opponent::Opponent;
pub use repository::AgentRepository;
