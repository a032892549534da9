//! Serialization support for temporal difference learning agents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    adapters::MsgPackRepository,
    error::{Error, Result},
    ports::AgentRepository,
    q_learning::agent::{TdAgent, TdAgentState, TdAlgorithm, TrainingMetadata},
};

/// Persisted form of a [`TdAgent`]: the value table plus every scalar needed
/// to reproduce its decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTdAgent {
    pub version: u32,
    state: TdAgentState,
}

impl SavedTdAgent {
    pub const VERSION: u32 = 1;

    pub fn from_agent(agent: &TdAgent) -> Self {
        Self {
            version: Self::VERSION,
            state: agent.export_state(),
        }
    }

    pub fn algorithm(&self) -> TdAlgorithm {
        self.state.algorithm
    }

    pub fn metadata(&self) -> TrainingMetadata {
        self.state.metadata
    }

    /// Rebuild the agent, checking the blob is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] on a version mismatch, an out-of-range
    /// epsilon, or a table entry for an occupied cell.
    pub fn to_agent(&self) -> Result<TdAgent> {
        if self.version != Self::VERSION {
            return Err(Error::corrupt(format!(
                "unsupported TD save format version: {}, expected {}",
                self.version,
                Self::VERSION
            )));
        }
        self.state.config.validate().map_err(Error::corrupt)?;
        if !(self.state.epsilon.is_finite() && (0.0..=1.0).contains(&self.state.epsilon)) {
            return Err(Error::corrupt(format!(
                "saved epsilon {} is outside [0, 1]",
                self.state.epsilon
            )));
        }
        self.state.q_table.validate()?;

        Ok(TdAgent::from_state(self.state.clone()))
    }

    /// Encode as MessagePack.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::corrupt(format!("failed to encode agent: {e}")))
    }

    /// Decode from MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] for truncated or schema-mismatched input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| Error::corrupt(format!("failed to decode agent: {e}")))
    }
}

impl TdAgent {
    /// Save the agent as a MessagePack file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        MsgPackRepository::new().save(&SavedTdAgent::from_agent(self), path.as_ref())
    }

    /// Load an agent saved with [`TdAgent::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        MsgPackRepository::new().load(path.as_ref())?.to_agent()
    }
}
