//! Q-table implementation for temporal difference learning

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{Action, StateKey};

/// Value of every (state, action) pair that has never been updated.
pub const INITIAL_Q_VALUE: f64 = 0.0;

/// Q-table mapping (state, action) pairs to Q-values
///
/// Entries are kept ordered so that two equal tables serialize to identical
/// bytes. Reads never insert; only [`QTable::set`] grows the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    q_values: BTreeMap<(StateKey, Action), f64>,
}

impl QTable {
    /// Create an empty Q-table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: &StateKey, action: Action) -> f64 {
        self.q_values
            .get(&(state.clone(), action))
            .copied()
            .unwrap_or(INITIAL_Q_VALUE)
    }

    /// Whether the pair has a stored value
    pub fn contains(&self, state: &StateKey, action: Action) -> bool {
        self.q_values.contains_key(&(state.clone(), action))
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: StateKey, action: Action, value: f64) {
        self.q_values.insert((state, action), value);
    }

    /// Maximum Q-value over legal actions; 0.0 when there are none
    pub fn max_q(&self, state: &StateKey, legal_actions: &[Action]) -> f64 {
        legal_actions
            .iter()
            .map(|&action| self.get(state, action))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Greedy action (highest Q-value) among legal actions.
    ///
    /// Ties go to the lowest row, then the lowest column, regardless of the
    /// order `legal_actions` is given in.
    pub fn greedy_action(&self, state: &StateKey, legal_actions: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for &action in legal_actions {
            let value = self.get(state, action);
            best = match best {
                Some((best_action, best_value))
                    if best_value > value || (best_value == value && best_action < action) =>
                {
                    Some((best_action, best_value))
                }
                _ => Some((action, value)),
            };
        }
        best.map(|(action, _)| action)
    }

    /// Move Q(s,a) toward `td_target` by `learning_rate` and return the new value.
    ///
    /// Q(s,a) ← Q(s,a) + α[target - Q(s,a)]
    pub fn td_update(
        &mut self,
        state: StateKey,
        action: Action,
        td_target: f64,
        learning_rate: f64,
    ) -> f64 {
        let current_q = self.get(&state, action);
        let td_error = td_target - current_q;
        let new_q = current_q + learning_rate * td_error;
        self.set(state, action, new_q);
        new_q
    }

    /// Distinct states with at least one stored value
    pub fn state_keys(&self) -> BTreeSet<&StateKey> {
        self.q_values.keys().map(|(state, _)| state).collect()
    }

    /// Stored entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, Action, f64)> {
        self.q_values
            .iter()
            .map(|((state, action), &value)| (state, *action, value))
    }

    /// Check that no entry refers to an occupied cell and every value is finite.
    pub fn validate(&self) -> crate::Result<()> {
        for ((state, action), value) in &self.q_values {
            if !state.is_legal(*action) {
                return Err(crate::Error::corrupt(format!(
                    "entry for state '{state}' targets occupied cell {action}"
                )));
            }
            if !value.is_finite() {
                return Err(crate::Error::corrupt(format!(
                    "entry for state '{state}' action {action} has non-finite value {value}"
                )));
            }
        }
        Ok(())
    }

    /// Remove every stored value
    pub fn reset(&mut self) {
        self.q_values.clear();
    }

    /// Get total number of Q-values stored
    pub fn size(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }
}
