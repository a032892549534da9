//! In-memory agent repository for testing.
//!
//! Stores encoded agents in a shared map so tests exercise the same
//! MessagePack path as the file adapter without touching the file system.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, error::Error, ports::AgentRepository, q_learning::SavedTdAgent};

/// In-memory repository for testing.
///
/// All clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use qttt::adapters::InMemoryRepository;
/// use qttt::app::AgentConfig;
/// use qttt::ports::AgentRepository;
/// use qttt::q_learning::{SavedTdAgent, TdAgent};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let agent = TdAgent::q_learning(AgentConfig::default());
///
/// repo.save(&SavedTdAgent::from_agent(&agent), Path::new("agent"))?;
/// let loaded = repo.load(Path::new("agent"))?;
/// # Ok::<(), qttt::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of agents currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Clear all stored agents.
    pub fn clear(&self) {
        self.storage().clear();
    }

    /// Store raw bytes at `path`, bypassing encoding.
    pub fn insert_raw(&self, path: &Path, bytes: Vec<u8>) {
        self.storage()
            .insert(path.to_string_lossy().to_string(), bytes);
    }
}

impl AgentRepository for InMemoryRepository {
    fn save(&self, agent: &SavedTdAgent, path: &Path) -> Result<()> {
        let bytes = agent.to_bytes()?;
        self.insert_raw(path, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedTdAgent> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load agent from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        SavedTdAgent::from_bytes(bytes)
    }

    fn exists(&self, path: &Path) -> bool {
        self.storage()
            .contains_key(path.to_string_lossy().as_ref())
    }
}
