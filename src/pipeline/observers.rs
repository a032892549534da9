//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::Observer,
    tictactoe::{GameOutcome, Player},
    types::{Action, StateKey},
};

/// Win/draw/loss tally from one player's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    wins: usize,
    draws: usize,
    losses: usize,
}

impl Tally {
    fn record(&mut self, outcome: GameOutcome, player: Player) {
        match outcome {
            GameOutcome::Win(winner) if winner == player => self.wins += 1,
            GameOutcome::Win(_) => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    fn games(&self) -> usize {
        self.wins + self.draws + self.losses
    }
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    agent_player: Player,
    tally: Tally,
}

impl ProgressObserver {
    /// Create a progress observer counting results for `agent_player`
    pub fn new(agent_player: Player) -> Self {
        Self {
            progress_bar: None,
            agent_player,
            tally: Tally::default(),
        }
    }

    fn message(&self) -> String {
        format!(
            "{} D:{} L:{}",
            self.tally.wins, self.tally.draws, self.tally.losses
        )
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (W:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(&mut self, game_num: usize, outcome: GameOutcome) -> Result<()> {
        self.tally.record(outcome, self.agent_player);

        if let Some(pb) = &self.progress_bar {
            pb.set_position(game_num as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    agent_player: Player,
    tally: Tally,
    current_moves: usize,
    move_counts: Vec<usize>,
}

impl MetricsObserver {
    /// Create a metrics observer counting results for `agent_player`
    pub fn new(agent_player: Player) -> Self {
        Self {
            agent_player,
            tally: Tally::default(),
            current_moves: 0,
            move_counts: Vec::new(),
        }
    }

    fn rate(&self, count: usize) -> f64 {
        match self.tally.games() {
            0 => 0.0,
            games => count as f64 / games as f64,
        }
    }

    /// Get current win rate
    pub fn win_rate(&self) -> f64 {
        self.rate(self.tally.wins)
    }

    /// Get current draw rate
    pub fn draw_rate(&self) -> f64 {
        self.rate(self.tally.draws)
    }

    /// Get current loss rate
    pub fn loss_rate(&self) -> f64 {
        self.rate(self.tally.losses)
    }

    /// Get average game length
    pub fn avg_game_length(&self) -> f64 {
        if self.move_counts.is_empty() {
            0.0
        } else {
            self.move_counts.iter().sum::<usize>() as f64 / self.move_counts.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.tally.games(),
            wins: self.tally.wins,
            draws: self.tally.draws,
            losses: self.tally.losses,
            win_rate: self.win_rate(),
            draw_rate: self.draw_rate(),
            loss_rate: self.loss_rate(),
            avg_game_length: self.avg_game_length(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub avg_game_length: f64,
}

impl Observer for MetricsObserver {
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        self.current_moves = 0;
        Ok(())
    }

    fn on_move(
        &mut self,
        _game_num: usize,
        _state: &StateKey,
        _action: Action,
        _player: Player,
    ) -> Result<()> {
        self.current_moves += 1;
        Ok(())
    }

    fn on_game_end(&mut self, _game_num: usize, outcome: GameOutcome) -> Result<()> {
        self.tally.record(outcome, self.agent_player);
        self.move_counts.push(self.current_moves);
        Ok(())
    }
}

/// Logs a running win/draw/loss summary every `interval` games
pub struct TracingObserver {
    agent_player: Player,
    interval: usize,
    window: Tally,
    total: Tally,
}

impl TracingObserver {
    pub fn new(agent_player: Player, interval: usize) -> Self {
        Self {
            agent_player,
            interval: interval.max(1),
            window: Tally::default(),
            total: Tally::default(),
        }
    }
}

impl Observer for TracingObserver {
    fn on_game_end(&mut self, game_num: usize, outcome: GameOutcome) -> Result<()> {
        self.window.record(outcome, self.agent_player);
        self.total.record(outcome, self.agent_player);

        if (game_num + 1) % self.interval == 0 {
            tracing::info!(
                games = game_num + 1,
                wins = self.window.wins,
                draws = self.window.draws,
                losses = self.window.losses,
                "training progress (last {} games)",
                self.interval
            );
            self.window = Tally::default();
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        tracing::debug!(
            wins = self.total.wins,
            draws = self.total.draws,
            losses = self.total.losses,
            "observer totals"
        );
        Ok(())
    }
}
