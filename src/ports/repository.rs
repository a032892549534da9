//! Repository port for agent persistence.
//!
//! This module defines the trait boundary between the learning core and the
//! storage used to carry a value table across process restarts.

use std::path::Path;

use crate::{Result, q_learning::SavedTdAgent};

/// Port for persisting and loading saved agents.
///
/// # Examples
///
/// ```no_run
/// use qttt::ports::AgentRepository;
/// use qttt::q_learning::{SavedTdAgent, TdAgent};
/// use std::path::Path;
///
/// fn checkpoint<R: AgentRepository>(repo: &R, agent: &TdAgent, path: &Path) -> qttt::Result<()> {
///     repo.save(&SavedTdAgent::from_agent(agent), path)
/// }
/// ```
pub trait AgentRepository {
    /// Save an agent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or encoding fails.
    fn save(&self, agent: &SavedTdAgent, path: &Path) -> Result<()>;

    /// Load an agent snapshot.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Io`] if nothing is stored at `path`
    /// - [`crate::Error::CorruptState`] if the stored bytes do not decode
    fn load(&self, path: &Path) -> Result<SavedTdAgent>;

    /// Whether something is stored at `path`.
    fn exists(&self, path: &Path) -> bool;
}
