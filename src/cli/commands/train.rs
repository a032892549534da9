//! Train command - Train a Q-learning or SARSA agent against a scripted opponent

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    app::{AgentConfig, App, AppConfig},
    cli::output::{format_number, format_percent, print_kv, print_section},
    pipeline::{
        OpponentKind, ProgressObserver, TracingObserver, TrainingPipeline, TrainingResult,
    },
    q_learning::{TdAgent, TdAlgorithm},
    tictactoe::Player,
};

/// Algorithm choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Q-learning (off-policy TD control)
    QLearning,
    /// SARSA (on-policy TD control)
    Sarsa,
}

impl From<AlgorithmArg> for TdAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::QLearning => TdAlgorithm::QLearning,
            AlgorithmArg::Sarsa => TdAlgorithm::Sarsa,
        }
    }
}

/// Opponent choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpponentArg {
    /// Uniformly random legal moves
    Random,
    /// Wins when it can, blocks when it must
    Defensive,
}

impl From<OpponentArg> for OpponentKind {
    fn from(arg: OpponentArg) -> Self {
        match arg {
            OpponentArg::Random => OpponentKind::Random,
            OpponentArg::Defensive => OpponentKind::Defensive,
        }
    }
}

pub(crate) fn parse_player_token(value: &str, flag: &str) -> Result<Player> {
    match value.trim().to_ascii_lowercase().as_str() {
        "x" | "first" | "p1" => Ok(Player::X),
        "o" | "second" | "p2" => Ok(Player::O),
        other => Err(anyhow!(
            "Invalid value '{other}' for {flag} (expected 'x' or 'o')"
        )),
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train an agent")]
pub struct TrainArgs {
    /// TD control algorithm for a fresh agent
    #[arg(long, short = 'a', value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Number of training games
    #[arg(long, short = 'g')]
    pub games: Option<usize>,

    /// Opponent to train against
    #[arg(long, short = 'o', value_enum)]
    pub opponent: Option<OpponentArg>,

    /// Which token the agent controls (`x` or `o`)
    #[arg(long)]
    pub agent_mark: Option<String>,

    /// Which token makes the first move (`x` or `o`)
    #[arg(long)]
    pub first: Option<String>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Where to save the trained agent (continues training if it exists)
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Ignore any agent already stored at the output path
    #[arg(long, default_value_t = false)]
    pub fresh: bool,

    /// Learning rate (alpha)
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Discount factor (gamma)
    #[arg(long)]
    pub discount: Option<f64>,

    /// Exploration rate (epsilon)
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Multiplicative epsilon decay per episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Epsilon floor for decay
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    training: &'a TrainingResult,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    algorithm: TdAlgorithm,
    opponent: OpponentKind,
    agent_player: String,
    first_player: String,
    seed: Option<u64>,
    q_table_entries: usize,
    states: usize,
    episodes: u64,
    epsilon: f64,
}

/// Merge command-line overrides into the file (or default) configuration.
fn resolve_config(args: &TrainArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm.into();
    }
    if let Some(games) = args.games {
        config.training.num_games = games;
    }
    if let Some(opponent) = args.opponent {
        config.training.opponent = opponent.into();
    }
    if let Some(mark) = &args.agent_mark {
        config.training.agent_player = parse_player_token(mark, "--agent-mark")?;
    }
    if let Some(first) = &args.first {
        config.training.first_player = parse_player_token(first, "--first")?;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }
    if let Some(output) = &args.output {
        config.agent_path = output.clone();
    }

    let base = config.agent;
    let mut agent = AgentConfig::new(
        args.learning_rate.unwrap_or(base.learning_rate()),
        args.discount.unwrap_or(base.discount_factor()),
        args.epsilon.unwrap_or(base.epsilon()),
    )?
    .with_epsilon_decay(
        args.epsilon_decay.unwrap_or(base.epsilon_decay()),
        args.min_epsilon.unwrap_or(base.min_epsilon()),
    )?;
    if let Some(seed) = base.seed().or(config.training.seed) {
        agent = agent.with_seed(seed);
    }
    config.agent = agent;

    config.validate()?;
    Ok(config)
}

fn write_summary(
    path: &Path,
    result: &TrainingResult,
    config: &AppConfig,
    agent: &TdAgent,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let summary = TrainingSummaryFile {
        training: result,
        metadata: SummaryMetadata {
            algorithm: agent.algorithm(),
            opponent: config.training.opponent,
            agent_player: config.training.agent_player.to_string(),
            first_player: config.training.first_player.to_string(),
            seed: config.training.seed,
            q_table_entries: agent.q_table().size(),
            states: agent.q_table().state_keys().len(),
            episodes: agent.metadata().episodes,
            epsilon: agent.epsilon(),
        },
    };
    to_writer_pretty(BufWriter::new(file), &summary)?;
    Ok(())
}

fn has_hyperparameter_flags(args: &TrainArgs) -> bool {
    [
        args.learning_rate,
        args.discount,
        args.epsilon,
        args.epsilon_decay,
        args.min_epsilon,
    ]
    .iter()
    .any(Option::is_some)
}

/// Fold explicit flags into an agent loaded from disk.
///
/// Hyperparameter flags replace the stored values and keep the table. The
/// algorithm of a stored agent is fixed; asking for another one is an error.
fn apply_overrides(agent: &mut TdAgent, args: &TrainArgs, config: &AppConfig) -> Result<()> {
    let path = config.agent_path.display();
    if let Some(algorithm) = args.algorithm.map(TdAlgorithm::from)
        && algorithm != agent.algorithm()
    {
        bail!(
            "{path} holds a {} agent; pass --fresh to train a new {} agent",
            agent.name(),
            algorithm.name()
        );
    }
    if config.algorithm != agent.algorithm() {
        tracing::warn!(
            path = %path,
            stored = agent.name(),
            configured = config.algorithm.name(),
            "keeping the stored algorithm"
        );
    }

    if !has_hyperparameter_flags(args) {
        return Ok(());
    }

    let stored = *agent.config();
    let mut updated = AgentConfig::new(
        args.learning_rate.unwrap_or(stored.learning_rate()),
        args.discount.unwrap_or(stored.discount_factor()),
        args.epsilon.unwrap_or(stored.epsilon()),
    )?
    .with_epsilon_decay(
        args.epsilon_decay.unwrap_or(stored.epsilon_decay()),
        args.min_epsilon.unwrap_or(stored.min_epsilon()),
    )?;
    if let Some(seed) = stored.seed() {
        updated = updated.with_seed(seed);
    }

    tracing::warn!(
        path = %path,
        learning_rate = updated.learning_rate(),
        discount_factor = updated.discount_factor(),
        epsilon = updated.epsilon(),
        epsilon_decay = updated.epsilon_decay(),
        min_epsilon = updated.min_epsilon(),
        "overriding hyperparameters of stored agent"
    );
    agent.set_config(updated);
    if let Some(epsilon) = args.epsilon {
        agent.set_epsilon(epsilon)?;
    }
    Ok(())
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let app = App::new();
    let path = config.agent_path.as_path();

    let mut agent = if !args.fresh && app.repository().exists(path) {
        let mut agent = app
            .load_agent(path)
            .with_context(|| format!("Failed to load agent from {}", path.display()))?;
        apply_overrides(&mut agent, &args, &config)?;
        agent
    } else {
        app.create_agent(config.algorithm, config.agent)
    };

    let training = config.training.clone();
    let mut opponent = training.opponent.build(None);

    print_section(&format!(
        "Training {} vs {}",
        agent.name(),
        training.opponent.name()
    ));
    print_kv("Games", format_number(training.num_games));
    print_kv("Agent plays", training.agent_player);
    print_kv("First move", training.first_player);
    print_kv("Starting entries", format_number(agent.q_table().size()));

    let interval = (training.num_games / 10).max(1);
    let mut pipeline = TrainingPipeline::new(training.clone())
        .with_observer(Box::new(TracingObserver::new(training.agent_player, interval)));
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new(training.agent_player)));
    }

    let result = pipeline.run(&mut agent, opponent.as_mut())?;

    app.save_agent(&agent, path)
        .with_context(|| format!("Failed to save agent to {}", path.display()))?;

    print_section("Results");
    print_kv("Wins", format!("{} ({})", result.wins, format_percent(result.win_rate)));
    print_kv("Draws", format!("{} ({})", result.draws, format_percent(result.draw_rate)));
    print_kv(
        "Losses",
        format!("{} ({})", result.losses, format_percent(result.loss_rate)),
    );
    print_kv("Table entries", format_number(agent.q_table().size()));
    print_kv("Epsilon", format!("{:.4}", agent.epsilon()));
    print_kv("Saved to", path.display());

    if let Some(summary) = &args.summary {
        write_summary(summary, &result, &config, &agent)?;
        print_kv("Summary", summary.display());
    }

    Ok(())
}
