//! Q-learning and SARSA temporal difference learning
//!
//! This module implements tabular temporal difference (TD) control for
//! tic-tac-toe. Values are indexed by the board's [`StateKey`] and the
//! (row, col) [`Action`] taken from it.
//!
//! ## Algorithms
//!
//! - **Q-learning**: Off-policy TD control that learns optimal Q* values
//! - **SARSA**: On-policy TD control that learns Q^π for the followed policy
//!
//! ## Key Differences
//!
//! | Aspect | Q-learning | SARSA |
//! |--------|------------|-------|
//! | Policy | Off-policy (learns Q*) | On-policy (learns Q^π) |
//! | Update | Uses max_a Q(s',a') | Uses actual Q(s',a') |
//! | Caller supplies | next legal actions | next legal actions and next action |
//!
//! ## Usage Example
//!
//! ```no_run
//! use qttt::app::AgentConfig;
//! use qttt::q_learning::TdAgent;
//!
//! let config = AgentConfig::new(0.5, 0.9, 0.1)?;
//! let q_agent = TdAgent::q_learning(config);
//! let sarsa_agent = TdAgent::sarsa(config);
//!
//! q_agent.save("q_agent.msgpack")?;
//! let restored = TdAgent::load("q_agent.msgpack")?;
//! # Ok::<(), qttt::Error>(())
//! ```
//!
//! [`StateKey`]: crate::types::StateKey
//! [`Action`]: crate::types::Action

pub mod agent;
pub mod q_table;
pub mod reward;
pub mod serialization;

// Public re-exports
pub use agent::{TdAgent, TdAlgorithm, TrainingMetadata, Transition};
pub use q_table::{INITIAL_Q_VALUE, QTable};
pub use reward::{DRAW_REWARD, LOSS_REWARD, STEP_REWARD, WIN_REWARD, terminal_reward};
pub use serialization::SavedTdAgent;
