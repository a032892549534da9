//! Configuration types for agent creation and training runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, pipeline::TrainingConfig, q_learning::TdAlgorithm};

/// Default location of the persisted agent.
pub const DEFAULT_AGENT_PATH: &str = "q_agent.msgpack";

/// Hyperparameters of a temporal difference agent.
///
/// Fields are private and only settable through validated constructors, so an
/// `AgentConfig` in hand is always usable.
///
/// # Examples
///
/// ```
/// use qttt::app::AgentConfig;
///
/// let config = AgentConfig::new(0.5, 0.9, 0.1)?
///     .with_epsilon_decay(0.999, 0.01)?
///     .with_seed(42);
/// assert_eq!(config.learning_rate(), 0.5);
/// # Ok::<(), qttt::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAgentConfig", into = "RawAgentConfig")]
pub struct AgentConfig {
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    seed: Option<u64>,
}

/// Unvalidated mirror of [`AgentConfig`] used for (de)serialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RawAgentConfig {
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    seed: Option<u64>,
}

impl Default for RawAgentConfig {
    fn default() -> Self {
        AgentConfig::default().into()
    }
}

impl TryFrom<RawAgentConfig> for AgentConfig {
    type Error = Error;

    fn try_from(raw: RawAgentConfig) -> Result<Self> {
        let config = AgentConfig {
            learning_rate: raw.learning_rate,
            discount_factor: raw.discount_factor,
            epsilon: raw.epsilon,
            epsilon_decay: raw.epsilon_decay,
            min_epsilon: raw.min_epsilon,
            seed: raw.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<AgentConfig> for RawAgentConfig {
    fn from(config: AgentConfig) -> Self {
        RawAgentConfig {
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            min_epsilon: config.min_epsilon,
            seed: config.seed,
        }
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfiguration { message }
}

impl AgentConfig {
    /// Create a configuration with a constant exploration rate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] unless `0 < alpha <= 1`,
    /// `0 <= gamma <= 1` and `0 <= epsilon <= 1`.
    pub fn new(learning_rate: f64, discount_factor: f64, epsilon: f64) -> Result<Self> {
        let config = AgentConfig {
            learning_rate,
            discount_factor,
            epsilon,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Decay epsilon multiplicatively after every episode, never below `min_epsilon`.
    pub fn with_epsilon_decay(mut self, epsilon_decay: f64, min_epsilon: f64) -> Result<Self> {
        self.epsilon_decay = epsilon_decay;
        self.min_epsilon = min_epsilon;
        self.validate()?;
        Ok(self)
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// α: step size of every update
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// γ: weight of the bootstrapped successor value
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// ε at the start of training
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn epsilon_decay(&self) -> f64 {
        self.epsilon_decay
    }

    pub fn min_epsilon(&self) -> f64 {
        self.min_epsilon
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(invalid(format!("{name} must be within [0, 1], got {value}")))
            }
        };

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid(format!(
                "learning_rate must be within (0, 1], got {}",
                self.learning_rate
            )));
        }
        unit("discount_factor", self.discount_factor)?;
        unit("epsilon", self.epsilon)?;
        unit("min_epsilon", self.min_epsilon)?;
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(invalid(format!(
                "epsilon_decay must be within (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if self.min_epsilon > self.epsilon {
            return Err(invalid(format!(
                "min_epsilon ({}) must not exceed epsilon ({})",
                self.min_epsilon, self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    /// α = 0.5, γ = 0.9, ε = 0.1, no decay, no seed.
    fn default() -> Self {
        AgentConfig {
            learning_rate: 0.5,
            discount_factor: 0.9,
            epsilon: 0.1,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            seed: None,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
///
/// ```toml
/// algorithm = "sarsa"
/// agent_path = "agents/sarsa.msgpack"
///
/// [agent]
/// learning_rate = 0.3
/// epsilon = 0.2
///
/// [training]
/// num_games = 20000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub algorithm: TdAlgorithm,
    pub agent_path: PathBuf,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            algorithm: TdAlgorithm::QLearning,
            agent_path: PathBuf::from(DEFAULT_AGENT_PATH),
            agent: AgentConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config file {path:?}"),
            source,
        })?;
        let config: AppConfig = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        if self.training.num_games == 0 {
            return Err(invalid("training.num_games must be > 0".to_string()));
        }
        Ok(())
    }
}
