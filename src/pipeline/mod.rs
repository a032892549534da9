//! Training and play pipeline
//!
//! This module provides:
//! - [`Session`]: one game bound to a borrowed agent, for any front end
//! - Scripted opponents to train against
//! - [`TrainingPipeline`]: many sessions in a row, reported to observers

pub mod observers;
pub mod opponents;
pub mod session;
pub mod training;

pub use observers::{MetricsObserver, MetricsSummary, ProgressObserver, TracingObserver};
pub use opponents::{DefensiveOpponent, OpponentKind, RandomOpponent};
pub use session::Session;
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Observer, Opponent};
