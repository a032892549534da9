//! Application layer: configuration and the dependency injection container.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ App (container)                          │
//! │   owns ─► AgentRepository                │
//! │             ├─ MsgPackRepository (file)  │
//! │             └─ InMemoryRepository (test) │
//! │   creates / loads / saves ─► TdAgent     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use qttt::app::{AgentConfig, App};
//! use qttt::q_learning::TdAlgorithm;
//!
//! let app = App::new();
//! let config = AgentConfig::new(0.5, 0.9, 0.1)?.with_seed(42);
//! let agent = app.create_agent(TdAlgorithm::QLearning, config);
//! # Ok::<(), qttt::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::{AgentConfig, AppConfig, DEFAULT_AGENT_PATH};
pub use container::{App, AppBuilder};
