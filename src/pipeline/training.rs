//! Training pipeline for a TD agent against a scripted opponent

use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use super::{opponents::OpponentKind, session::Session};
use crate::{
    Error, Result,
    ports::{Observer, Opponent},
    q_learning::TdAgent,
    tictactoe::{GameOutcome, Player},
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training games
    pub num_games: usize,

    /// Random seed
    pub seed: Option<u64>,

    /// Whether the agent plays as X or O
    pub agent_player: Player,

    /// Which player opens each game
    pub first_player: Player,

    /// Opponent the agent trains against
    pub opponent: OpponentKind,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_games: 10_000,
            seed: None,
            agent_player: Player::O,
            first_player: Player::X,
            opponent: OpponentKind::Random,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Total games played
    pub total_games: usize,

    /// Number of wins
    pub wins: usize,

    /// Number of draws
    pub draws: usize,

    /// Number of losses
    pub losses: usize,

    /// Win rate
    pub win_rate: f64,

    /// Draw rate
    pub draw_rate: f64,

    /// Loss rate
    pub loss_rate: f64,
}

impl TrainingResult {
    /// Create a new training result
    pub fn new(total_games: usize, wins: usize, draws: usize, losses: usize) -> Self {
        let rate = |count: usize| {
            if total_games > 0 {
                count as f64 / total_games as f64
            } else {
                0.0
            }
        };

        Self {
            total_games,
            wins,
            draws,
            losses,
            win_rate: rate(wins),
            draw_rate: rate(draws),
            loss_rate: rate(losses),
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open {}", path.display()),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Training pipeline for a single agent against an opponent
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run training with the given agent and opponent
    ///
    /// Every game is played through a learning [`Session`], so the agent is
    /// updated after each of its moves and once more when the game ends.
    pub fn run(&mut self, agent: &mut TdAgent, opponent: &mut dyn Opponent) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed);
            opponent.set_rng_seed(seed.wrapping_add(1));
        }

        tracing::info!(
            games = self.config.num_games,
            algorithm = agent.name(),
            opponent = opponent.name(),
            agent_player = %self.config.agent_player,
            first_player = %self.config.first_player,
            "training started"
        );

        let mut wins = 0;
        let mut draws = 0;
        let mut losses = 0;

        for observer in &mut self.observers {
            observer.on_training_start(self.config.num_games)?;
        }

        for game_num in 0..self.config.num_games {
            let outcome = self.play_game(game_num, agent, opponent)?;

            // Count from agent's perspective
            match outcome {
                GameOutcome::Win(winner) if winner == self.config.agent_player => wins += 1,
                GameOutcome::Win(_) => losses += 1,
                GameOutcome::Draw => draws += 1,
            }

            for observer in &mut self.observers {
                observer.on_game_end(game_num, outcome)?;
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::new(self.config.num_games, wins, draws, losses);
        tracing::info!(
            wins,
            draws,
            losses,
            entries = agent.q_table().size(),
            epsilon = agent.epsilon(),
            "training finished"
        );
        Ok(result)
    }

    fn play_game(
        &mut self,
        game_num: usize,
        agent: &mut TdAgent,
        opponent: &mut dyn Opponent,
    ) -> Result<GameOutcome> {
        for observer in &mut self.observers {
            observer.on_game_start(game_num)?;
        }

        let agent_mark = self.config.agent_player;
        let opponent_mark = agent_mark.opponent();
        let mut session = Session::training(agent, agent_mark, self.config.first_player);

        let outcome = loop {
            if let Some(outcome) = session.outcome() {
                break outcome;
            }

            let state = session.game().state_key();
            let (action, mark) = if session.is_agent_turn() {
                (session.agent_move()?, agent_mark)
            } else {
                let action = opponent.select_action(session.game(), opponent_mark)?;
                session.opponent_move(action.row, action.col)?;
                (action, opponent_mark)
            };

            for observer in &mut self.observers {
                observer.on_move(game_num, &state, action, mark)?;
            }
        };

        Ok(outcome)
    }
}
