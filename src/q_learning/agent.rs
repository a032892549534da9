//! Q-learning and SARSA agents
//!
//! One [`TdAgent`] type covers both algorithms. They share epsilon-greedy
//! action selection and differ only in how the successor value is
//! bootstrapped during [`TdAgent::update`].

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    app::AgentConfig,
    error::{Error, Result},
    q_learning::q_table::QTable,
    types::{Action, StateKey},
};

/// Which temporal difference rule an agent applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TdAlgorithm {
    /// Off-policy: bootstrap from max_a' Q(s',a')
    QLearning,
    /// On-policy: bootstrap from Q(s',a') for the action actually taken
    Sarsa,
}

impl TdAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            TdAlgorithm::QLearning => "Q-Learning",
            TdAlgorithm::Sarsa => "SARSA",
        }
    }
}

/// One observed step of experience.
///
/// A transition is terminal when `next_legal_actions` is empty; the
/// bootstrapped term is then zero for both algorithms.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub state: &'a StateKey,
    pub action: Action,
    pub reward: f64,
    pub next_state: &'a StateKey,
    pub next_legal_actions: &'a [Action],
    /// Action taken (or about to be taken) in `next_state`; required by SARSA
    /// on non-terminal transitions, ignored by Q-learning.
    pub next_action: Option<Action>,
}

impl<'a> Transition<'a> {
    /// Final transition of an episode: nothing to bootstrap from.
    pub fn terminal(
        state: &'a StateKey,
        action: Action,
        reward: f64,
        next_state: &'a StateKey,
    ) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            next_legal_actions: &[],
            next_action: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_legal_actions.is_empty()
    }

    /// Reject transitions that could never have been observed.
    ///
    /// Keeps the table free of entries for occupied cells.
    fn check_legal(&self) -> Result<()> {
        let occupied = |action: Action| Error::IllegalMove {
            row: action.row,
            col: action.col,
        };

        if !self.state.is_legal(self.action) {
            return Err(occupied(self.action));
        }
        if let Some(&bad) = self
            .next_legal_actions
            .iter()
            .find(|&&a| !self.next_state.is_legal(a))
        {
            return Err(occupied(bad));
        }
        if let Some(next_action) = self.next_action
            && !self.is_terminal()
            && !self.next_legal_actions.contains(&next_action)
        {
            return Err(occupied(next_action));
        }
        Ok(())
    }
}

/// Training counters carried alongside the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Completed episodes
    pub episodes: u64,
    /// Value updates applied
    pub updates: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TdAgentState {
    pub algorithm: TdAlgorithm,
    pub config: AgentConfig,
    pub epsilon: f64,
    pub q_table: QTable,
    pub metadata: TrainingMetadata,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Tabular temporal difference agent.
///
/// Owns its Q-table and hyperparameters and outlives any single game.
///
/// # Examples
///
/// ```
/// use qttt::app::AgentConfig;
/// use qttt::q_learning::TdAgent;
/// use qttt::tictactoe::Game;
///
/// let mut agent = TdAgent::q_learning(AgentConfig::new(0.5, 0.9, 0.0)?.with_seed(7));
/// let game = Game::new();
/// let action = agent.get_action(&game.state_key(), &game.legal_actions())?;
/// assert!(game.legal_actions().contains(&action));
/// # Ok::<(), qttt::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TdAgent {
    algorithm: TdAlgorithm,
    config: AgentConfig,
    q_table: QTable,
    epsilon: f64,
    metadata: TrainingMetadata,
    rng: StdRng,
}

impl TdAgent {
    /// Create a new agent with an empty table
    pub fn new(algorithm: TdAlgorithm, config: AgentConfig) -> Self {
        Self {
            algorithm,
            config,
            q_table: QTable::new(),
            epsilon: config.epsilon(),
            metadata: TrainingMetadata::default(),
            rng: build_rng(config.seed()),
        }
    }

    /// Off-policy agent
    pub fn q_learning(config: AgentConfig) -> Self {
        Self::new(TdAlgorithm::QLearning, config)
    }

    /// On-policy agent
    pub fn sarsa(config: AgentConfig) -> Self {
        Self::new(TdAlgorithm::Sarsa, config)
    }

    pub fn algorithm(&self) -> TdAlgorithm {
        self.algorithm
    }

    pub fn name(&self) -> &str {
        self.algorithm.name()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn metadata(&self) -> TrainingMetadata {
        self.metadata
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the current exploration rate, e.g. 0.0 for pure exploitation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] outside `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        if !(epsilon.is_finite() && (0.0..=1.0).contains(&epsilon)) {
            return Err(Error::InvalidConfiguration {
                message: format!("epsilon must be within [0, 1], got {epsilon}"),
            });
        }
        self.epsilon = epsilon;
        Ok(())
    }

    /// Replace the hyperparameters while keeping everything learned so far.
    ///
    /// The current ε is left alone; use [`TdAgent::set_epsilon`] to move it.
    pub fn set_config(&mut self, config: AgentConfig) {
        self.config = config;
    }

    /// Re-seed the exploration RNG.
    pub fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Current estimate for a pair (0.0 if never updated)
    pub fn value(&self, state: &StateKey, action: Action) -> f64 {
        self.q_table.get(state, action)
    }

    /// Highest-valued legal action, ties to the lowest (row, col)
    pub fn greedy_action(&self, state: &StateKey, legal_actions: &[Action]) -> Result<Action> {
        self.q_table
            .greedy_action(state, legal_actions)
            .ok_or(Error::NoLegalMoves)
    }

    /// ε-greedy action selection.
    ///
    /// With probability ε picks uniformly among `legal_actions`, otherwise the
    /// greedy action. The table is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLegalMoves`] when `legal_actions` is empty.
    pub fn get_action(&mut self, state: &StateKey, legal_actions: &[Action]) -> Result<Action> {
        if legal_actions.is_empty() {
            return Err(Error::NoLegalMoves);
        }

        if self.rng.random::<f64>() < self.epsilon {
            legal_actions
                .choose(&mut self.rng)
                .copied()
                .ok_or(Error::NoLegalMoves)
        } else {
            self.greedy_action(state, legal_actions)
        }
    }

    /// Apply this agent's TD rule to one transition and return the new Q(s,a).
    ///
    /// - Q-learning: Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    /// - SARSA:      Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
    ///
    /// # Errors
    ///
    /// - [`Error::IllegalMove`] if the action is occupied in `state`, a next
    ///   legal action is occupied in `next_state`, or `next_action` is not
    ///   among the next legal actions
    /// - [`Error::MissingNextAction`] for a non-terminal SARSA transition
    ///   without `next_action`
    ///
    /// The table is unchanged on error.
    pub fn update(&mut self, transition: &Transition<'_>) -> Result<f64> {
        transition.check_legal()?;

        let bootstrap = if transition.is_terminal() {
            0.0
        } else {
            match self.algorithm {
                TdAlgorithm::QLearning => self
                    .q_table
                    .max_q(transition.next_state, transition.next_legal_actions),
                TdAlgorithm::Sarsa => {
                    let next_action = transition.next_action.ok_or(Error::MissingNextAction)?;
                    self.q_table.get(transition.next_state, next_action)
                }
            }
        };

        let td_target = transition.reward + self.config.discount_factor() * bootstrap;
        let new_q = self.q_table.td_update(
            transition.state.clone(),
            transition.action,
            td_target,
            self.config.learning_rate(),
        );
        self.metadata.updates += 1;

        tracing::trace!(
            algorithm = self.algorithm.name(),
            state = %transition.state,
            action = %transition.action,
            reward = transition.reward,
            td_target,
            new_q,
            "td update"
        );

        Ok(new_q)
    }

    /// Close an episode: count it and decay ε toward its floor.
    pub fn end_episode(&mut self) {
        self.metadata.episodes += 1;
        self.epsilon = (self.epsilon * self.config.epsilon_decay()).max(self.config.min_epsilon());
    }

    /// Forget everything learned and restore the initial ε and RNG.
    pub fn reset(&mut self) {
        self.q_table.reset();
        self.epsilon = self.config.epsilon();
        self.metadata = TrainingMetadata::default();
        self.rng = build_rng(self.config.seed());
    }

    pub(crate) fn export_state(&self) -> TdAgentState {
        TdAgentState {
            algorithm: self.algorithm,
            config: self.config,
            epsilon: self.epsilon,
            q_table: self.q_table.clone(),
            metadata: self.metadata,
        }
    }

    pub(crate) fn from_state(state: TdAgentState) -> Self {
        Self {
            algorithm: state.algorithm,
            config: state.config,
            q_table: state.q_table,
            epsilon: state.epsilon,
            metadata: state.metadata,
            rng: build_rng(state.config.seed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(row: usize, col: usize) -> Action {
        Action::new(row, col).unwrap()
    }

    fn key(s: &str) -> StateKey {
        StateKey::parse(s).unwrap()
    }

    fn config() -> AgentConfig {
        AgentConfig::new(0.5, 0.9, 0.0).unwrap().with_seed(7)
    }

    #[test]
    fn test_get_action_empty_legal_fails() {
        let mut agent = TdAgent::q_learning(config());
        assert!(matches!(
            agent.get_action(&StateKey::empty(), &[]),
            Err(Error::NoLegalMoves)
        ));
    }

    #[test]
    fn test_set_config_keeps_table() {
        let mut agent = TdAgent::q_learning(config());
        let state = key("X--------");
        let next = key("XO-------");
        agent
            .update(&Transition::terminal(&state, a(0, 1), 1.0, &next))
            .unwrap();

        agent.set_config(AgentConfig::new(0.2, 0.5, 0.3).unwrap());
        assert_eq!(agent.config().learning_rate(), 0.2);
        assert_eq!(agent.value(&state, a(0, 1)), 0.5);
        assert_eq!(agent.epsilon(), 0.0);
        assert_eq!(agent.metadata().updates, 1);

        // 0.5 + 0.2 * (1.0 - 0.5)
        let updated = agent
            .update(&Transition::terminal(&state, a(0, 1), 1.0, &next))
            .unwrap();
        assert!((updated - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_get_action_does_not_grow_table() {
        let mut agent = TdAgent::q_learning(config());
        let state = StateKey::empty();
        agent.get_action(&state, &state.empty_actions()).unwrap();
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_full_exploration_stays_legal() {
        let cfg = AgentConfig::new(0.5, 0.9, 1.0).unwrap().with_seed(3);
        let mut agent = TdAgent::sarsa(cfg);
        let state = key("XO-X-O---");
        let legal = state.empty_actions();
        for _ in 0..100 {
            let action = agent.get_action(&state, &legal).unwrap();
            assert!(legal.contains(&action));
        }
    }

    #[test]
    fn test_q_learning_update_uses_max() {
        let mut agent = TdAgent::q_learning(config());
        let s = StateKey::empty();
        let next = key("X---O----");
        agent.q_table.set(next.clone(), a(0, 1), 1.0);
        agent.q_table.set(next.clone(), a(0, 2), 2.0);

        let new_q = agent
            .update(&Transition {
                state: &s,
                action: a(0, 0),
                reward: 0.0,
                next_state: &next,
                next_legal_actions: &[a(0, 1), a(0, 2)],
                next_action: Some(a(0, 1)),
            })
            .unwrap();

        // 0 + 0.5 * (0 + 0.9 * 2.0 - 0) = 0.9
        assert!((new_q - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_sarsa_update_uses_next_action() {
        let mut agent = TdAgent::sarsa(config());
        let s = StateKey::empty();
        let next = key("X---O----");
        agent.q_table.set(next.clone(), a(0, 1), 1.0);
        agent.q_table.set(next.clone(), a(0, 2), 2.0);

        let new_q = agent
            .update(&Transition {
                state: &s,
                action: a(0, 0),
                reward: 0.0,
                next_state: &next,
                next_legal_actions: &[a(0, 1), a(0, 2)],
                next_action: Some(a(0, 1)),
            })
            .unwrap();

        // 0 + 0.5 * (0 + 0.9 * 1.0 - 0) = 0.45
        assert!((new_q - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_sarsa_requires_next_action() {
        let mut agent = TdAgent::sarsa(config());
        let s = StateKey::empty();
        let next = key("X---O----");
        let result = agent.update(&Transition {
            state: &s,
            action: a(0, 0),
            reward: 0.0,
            next_state: &next,
            next_legal_actions: &[a(0, 1)],
            next_action: None,
        });
        assert!(matches!(result, Err(Error::MissingNextAction)));
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_terminal_update_ignores_successor() {
        for mut agent in [TdAgent::q_learning(config()), TdAgent::sarsa(config())] {
            let s = key("XX-OO----");
            let next = key("XXXOO----");
            let new_q = agent
                .update(&Transition::terminal(&s, a(0, 2), 1.0, &next))
                .unwrap();
            assert!((new_q - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_update_rejects_occupied_action() {
        let mut agent = TdAgent::q_learning(config());
        let s = key("X--------");
        let next = key("XO-------");
        let result = agent.update(&Transition::terminal(&s, a(0, 0), 1.0, &next));
        assert!(matches!(result, Err(Error::IllegalMove { row: 0, col: 0 })));
        assert!(agent.q_table().is_empty());
        assert_eq!(agent.metadata().updates, 0);
    }

    #[test]
    fn test_update_rejects_occupied_next_legal() {
        let mut agent = TdAgent::q_learning(config());
        let s = StateKey::empty();
        let next = key("X--------");
        let result = agent.update(&Transition {
            state: &s,
            action: a(0, 0),
            reward: 0.0,
            next_state: &next,
            next_legal_actions: &[a(0, 0), a(0, 1)],
            next_action: None,
        });
        assert!(matches!(result, Err(Error::IllegalMove { row: 0, col: 0 })));
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_update_rejects_next_action_outside_legal_set() {
        let mut agent = TdAgent::sarsa(config());
        let s = StateKey::empty();
        let next = key("X---O----");
        let result = agent.update(&Transition {
            state: &s,
            action: a(0, 0),
            reward: 0.0,
            next_state: &next,
            next_legal_actions: &[a(0, 1)],
            next_action: Some(a(2, 2)),
        });
        assert!(matches!(result, Err(Error::IllegalMove { row: 2, col: 2 })));
    }

    #[test]
    fn test_epsilon_decay_floors_at_min() {
        let cfg = AgentConfig::new(0.5, 0.9, 0.5)
            .unwrap()
            .with_epsilon_decay(0.5, 0.2)
            .unwrap();
        let mut agent = TdAgent::q_learning(cfg);
        agent.end_episode();
        assert!((agent.epsilon() - 0.25).abs() < 1e-12);
        agent.end_episode();
        assert!((agent.epsilon() - 0.2).abs() < 1e-12);
        assert_eq!(agent.metadata().episodes, 2);
    }

    #[test]
    fn test_reset_clears_table_and_epsilon() {
        let cfg = AgentConfig::new(0.5, 0.9, 0.5)
            .unwrap()
            .with_epsilon_decay(0.5, 0.0)
            .unwrap();
        let mut agent = TdAgent::q_learning(cfg);
        let s = key("XX-OO----");
        let next = key("XXXOO----");
        agent
            .update(&Transition::terminal(&s, a(0, 2), 1.0, &next))
            .unwrap();
        agent.end_episode();

        agent.reset();
        assert!(agent.q_table().is_empty());
        assert_eq!(agent.epsilon(), 0.5);
        assert_eq!(agent.metadata(), TrainingMetadata::default());
    }

    #[test]
    fn test_set_epsilon_validates() {
        let mut agent = TdAgent::q_learning(config());
        assert!(agent.set_epsilon(1.5).is_err());
        agent.set_epsilon(0.3).unwrap();
        assert_eq!(agent.epsilon(), 0.3);
    }
}
