//! Scripted opponents for training and evaluation

use std::{fmt, str::FromStr};

use rand::{SeedableRng, prelude::IndexedRandom, random, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::Opponent,
    tictactoe::{Game, LineAnalyzer, Player},
    types::Action,
};

/// Opponent type for training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// Uniformly random legal moves
    #[default]
    Random,
    /// Takes a win, blocks a loss, otherwise random
    Defensive,
}

impl OpponentKind {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            OpponentKind::Random => "Random",
            OpponentKind::Defensive => "Defensive",
        }
    }

    /// Get short label
    pub fn label(&self) -> &'static str {
        match self {
            OpponentKind::Random => "random",
            OpponentKind::Defensive => "defensive",
        }
    }

    /// Build the opponent, seeded when `seed` is given.
    pub fn build(self, seed: Option<u64>) -> Box<dyn Opponent> {
        match self {
            OpponentKind::Random => Box::new(RandomOpponent::new(seed)),
            OpponentKind::Defensive => Box::new(DefensiveOpponent::new(seed)),
        }
    }
}

impl fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OpponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentKind::Random),
            "defensive" => Ok(OpponentKind::Defensive),
            other => Err(Error::InvalidConfiguration {
                message: format!("unknown opponent '{other}' (expected random or defensive)"),
            }),
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(random))
}

fn random_action(rng: &mut StdRng, game: &Game) -> Result<Action> {
    game.legal_actions()
        .choose(rng)
        .copied()
        .ok_or(Error::NoLegalMoves)
}

/// Plays a uniformly random legal move
pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }
}

impl Opponent for RandomOpponent {
    fn select_action(&mut self, game: &Game, _mark: Player) -> Result<Action> {
        random_action(&mut self.rng, game)
    }

    fn name(&self) -> &str {
        "Random"
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Completes its own line when it can, blocks the other side's line when it
/// must, and otherwise plays randomly.
pub struct DefensiveOpponent {
    rng: StdRng,
}

impl DefensiveOpponent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }
}

impl Opponent for DefensiveOpponent {
    fn select_action(&mut self, game: &Game, mark: Player) -> Result<Action> {
        let cells = game.board().cells();
        if let Some(action) = LineAnalyzer::winning_move(cells, mark) {
            return Ok(action);
        }
        if let Some(action) = LineAnalyzer::winning_move(cells, mark.opponent()) {
            return Ok(action);
        }
        random_action(&mut self.rng, game)
    }

    fn name(&self) -> &str {
        "Defensive"
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
