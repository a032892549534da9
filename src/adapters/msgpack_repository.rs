//! MessagePack implementation of the agent repository.
//!
//! This adapter implements the AgentRepository port using rmp_serde for
//! compact binary serialization.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, error::Error, ports::AgentRepository, q_learning::SavedTdAgent};

/// MessagePack-based agent repository.
///
/// # Examples
///
/// ```no_run
/// use qttt::adapters::MsgPackRepository;
/// use qttt::app::AgentConfig;
/// use qttt::ports::AgentRepository;
/// use qttt::q_learning::{SavedTdAgent, TdAgent};
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let agent = TdAgent::q_learning(AgentConfig::default());
///
/// repo.save(&SavedTdAgent::from_agent(&agent), Path::new("q_agent.msgpack"))?;
/// let loaded = repo.load(Path::new("q_agent.msgpack"))?.to_agent()?;
/// # Ok::<(), qttt::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl AgentRepository for MsgPackRepository {
    fn save(&self, agent: &SavedTdAgent, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, agent)
            .map_err(|e| Error::corrupt(format!("failed to encode agent: {e}")))?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        tracing::debug!(path = %path.display(), "saved agent");
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedTdAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        let reader = BufReader::new(file);

        let agent = rmp_serde::decode::from_read(reader)
            .map_err(|e| Error::corrupt(format!("failed to decode agent from {path:?}: {e}")))?;

        tracing::debug!(path = %path.display(), "loaded agent");
        Ok(agent)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
