//! Dependency injection container for the qttt application.
//!
//! The container owns the storage backend and is the one place agents are
//! created, loaded and saved. Front ends load the agent once at start-up and
//! pass it by reference from then on; there is no global table.

use std::{path::Path, sync::Arc};

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    ports::AgentRepository,
    q_learning::{SavedTdAgent, TdAgent, TdAlgorithm},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use qttt::app::{AgentConfig, App};
/// use qttt::q_learning::TdAlgorithm;
/// use std::path::Path;
///
/// let app = App::new();
/// let agent = app.load_or_create(
///     Path::new("q_agent.msgpack"),
///     TdAlgorithm::QLearning,
///     AgentConfig::default(),
/// )?;
/// # Ok::<(), qttt::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use qttt::adapters::InMemoryRepository;
/// use qttt::app::App;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    repository: Arc<dyn AgentRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app backed by `MsgPackRepository`, without a default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Get the agent repository.
    pub fn repository(&self) -> Arc<dyn AgentRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    /// Create a fresh agent. A seed in `config` wins over the app default.
    pub fn create_agent(&self, algorithm: TdAlgorithm, config: AgentConfig) -> TdAgent {
        let config = match (config.seed(), self.default_seed) {
            (None, Some(seed)) => config.with_seed(seed),
            _ => config,
        };
        tracing::info!(
            algorithm = algorithm.name(),
            learning_rate = config.learning_rate(),
            discount_factor = config.discount_factor(),
            epsilon = config.epsilon(),
            "created agent"
        );
        TdAgent::new(algorithm, config)
    }

    /// Load an agent from the repository.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if nothing is stored at `path` and
    /// [`crate::Error::CorruptState`] if the stored blob is unusable.
    pub fn load_agent(&self, path: &Path) -> Result<TdAgent> {
        let mut agent = self.repository.load(path)?.to_agent()?;
        if agent.config().seed().is_none()
            && let Some(seed) = self.default_seed
        {
            agent.set_rng_seed(seed);
        }
        tracing::info!(
            path = %path.display(),
            algorithm = agent.name(),
            entries = agent.q_table().size(),
            episodes = agent.metadata().episodes,
            "loaded agent"
        );
        Ok(agent)
    }

    /// Load the agent stored at `path`, or create a new one when nothing is
    /// stored there yet. A corrupt blob is reported, not silently replaced.
    pub fn load_or_create(
        &self,
        path: &Path,
        algorithm: TdAlgorithm,
        config: AgentConfig,
    ) -> Result<TdAgent> {
        if self.repository.exists(path) {
            self.load_agent(path)
        } else {
            tracing::info!(path = %path.display(), "no saved agent found, starting fresh");
            Ok(self.create_agent(algorithm, config))
        }
    }

    /// Save an agent to the repository.
    pub fn save_agent(&self, agent: &TdAgent, path: &Path) -> Result<()> {
        self.repository.save(&SavedTdAgent::from_agent(agent), path)?;
        tracing::info!(
            path = %path.display(),
            entries = agent.q_table().size(),
            "saved agent"
        );
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
pub struct AppBuilder {
    repository: Option<Arc<dyn AgentRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    /// Create a new app builder.
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    /// Set a custom agent repository.
    pub fn with_repository<R: AgentRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app, defaulting to `MsgPackRepository`.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
