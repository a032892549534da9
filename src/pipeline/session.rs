//! A game bound to a borrowed agent
//!
//! [`Session`] is the collaborator a front end drives. It owns the transient
//! [`Game`], borrows the long-lived [`TdAgent`], and when learning is enabled
//! turns the stream of moves into TD updates from the agent's point of view:
//!
//! - a transition runs from one agent decision to the next agent decision
//!   (or to the end of the game), spanning the opponent's reply;
//! - every non-terminal transition carries [`STEP_REWARD`] and the action the
//!   agent actually chose next, so SARSA and Q-learning see the same stream;
//! - the final transition carries the terminal reward and no successor.

use crate::{
    Error, Result,
    q_learning::{STEP_REWARD, TdAgent, Transition, terminal_reward},
    tictactoe::{Game, GameOutcome, Player},
    types::{Action, StateKey},
};

/// One match between the agent and someone else.
pub struct Session<'a> {
    agent: &'a mut TdAgent,
    game: Game,
    agent_mark: Player,
    to_move: Player,
    learning: bool,
    pending: Option<(StateKey, Action)>,
}

impl<'a> Session<'a> {
    /// Pure inference: the agent plays but its table is never touched.
    pub fn new(agent: &'a mut TdAgent, agent_mark: Player, first: Player) -> Self {
        Self {
            agent,
            game: Game::new(),
            agent_mark,
            to_move: first,
            learning: false,
            pending: None,
        }
    }

    /// Like [`Session::new`], but the agent learns from the match.
    pub fn training(agent: &'a mut TdAgent, agent_mark: Player, first: Player) -> Self {
        Self {
            learning: true,
            ..Self::new(agent, agent_mark, first)
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn agent(&self) -> &TdAgent {
        self.agent
    }

    pub fn agent_mark(&self) -> Player {
        self.agent_mark
    }

    /// Player expected to move next
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn is_agent_turn(&self) -> bool {
        !self.game.is_over() && self.to_move == self.agent_mark
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.game.outcome()
    }

    /// Ask the agent for its move and play it.
    ///
    /// # Errors
    ///
    /// [`Error::GameOver`] after the game ended, [`Error::OutOfTurn`] when it
    /// is not the agent's move.
    pub fn agent_move(&mut self) -> Result<Action> {
        self.ensure_turn(self.agent_mark)?;

        let state = self.game.state_key();
        let legal = self.game.legal_actions();
        let action = self.agent.get_action(&state, &legal)?;

        if self.learning
            && let Some((prev_state, prev_action)) = self.pending.take()
        {
            self.agent.update(&Transition {
                state: &prev_state,
                action: prev_action,
                reward: STEP_REWARD,
                next_state: &state,
                next_legal_actions: &legal,
                next_action: Some(action),
            })?;
        }

        self.game.play(action, self.agent_mark)?;
        self.pending = Some((state, action));
        self.advance()?;
        Ok(action)
    }

    /// Play the other side's move at (row, col).
    ///
    /// # Errors
    ///
    /// [`Error::GameOver`], [`Error::OutOfTurn`], or the game's own move
    /// errors. The board is unchanged on error.
    pub fn opponent_move(&mut self, row: usize, col: usize) -> Result<()> {
        self.ensure_turn(self.agent_mark.opponent())?;
        self.game.apply_move(row, col, self.agent_mark.opponent())?;
        self.advance()
    }

    fn ensure_turn(&self, mark: Player) -> Result<()> {
        if self.game.is_over() {
            return Err(Error::GameOver);
        }
        if self.to_move != mark {
            return Err(Error::OutOfTurn {
                expected: self.to_move,
            });
        }
        Ok(())
    }

    /// Hand the turn over and, once the game is decided, close the episode.
    fn advance(&mut self) -> Result<()> {
        self.to_move = self.to_move.opponent();

        let Some(outcome) = self.game.outcome() else {
            return Ok(());
        };
        if !self.learning {
            return Ok(());
        }

        if let Some((state, action)) = self.pending.take() {
            let terminal = self.game.state_key();
            let reward = terminal_reward(outcome, self.agent_mark);
            self.agent
                .update(&Transition::terminal(&state, action, reward, &terminal))?;
        }
        self.agent.end_episode();
        tracing::debug!(?outcome, agent = %self.agent_mark, "episode finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::AgentConfig, q_learning::TdAlgorithm};

    fn greedy_agent() -> TdAgent {
        TdAgent::q_learning(AgentConfig::new(0.5, 0.9, 0.0).unwrap().with_seed(1))
    }

    #[test]
    fn test_turn_order_enforced() {
        let mut agent = greedy_agent();
        let mut session = Session::new(&mut agent, Player::O, Player::X);
        assert!(!session.is_agent_turn());
        assert!(matches!(
            session.agent_move(),
            Err(Error::OutOfTurn {
                expected: Player::X
            })
        ));
        session.opponent_move(1, 1).unwrap();
        assert!(session.is_agent_turn());
        assert!(matches!(
            session.opponent_move(0, 0),
            Err(Error::OutOfTurn {
                expected: Player::O
            })
        ));
    }

    #[test]
    fn test_inference_session_does_not_learn() {
        let mut agent = greedy_agent();
        {
            let mut session = Session::new(&mut agent, Player::X, Player::X);
            while !session.game().is_over() {
                if session.is_agent_turn() {
                    session.agent_move().unwrap();
                } else {
                    let action = session.game().legal_actions()[0];
                    session.opponent_move(action.row, action.col).unwrap();
                }
            }
        }
        assert!(agent.q_table().is_empty());
        assert_eq!(agent.metadata().episodes, 0);
    }

    #[test]
    fn test_training_session_rewards_win() {
        // Greedy agent as X with an empty table plays (0,0), (0,1), (0,2) by
        // tie-break; the opponent answers in the middle row and loses.
        let mut agent = greedy_agent();
        {
            let mut session = Session::training(&mut agent, Player::X, Player::X);
            assert_eq!(session.agent_move().unwrap(), Action::new(0, 0).unwrap());
            session.opponent_move(1, 0).unwrap();
            assert_eq!(session.agent_move().unwrap(), Action::new(0, 1).unwrap());
            session.opponent_move(1, 1).unwrap();
            assert_eq!(session.agent_move().unwrap(), Action::new(0, 2).unwrap());
            assert_eq!(session.outcome(), Some(GameOutcome::Win(Player::X)));
            assert!(matches!(session.agent_move(), Err(Error::GameOver)));
        }

        let winning_state = StateKey::parse("XX-OO----").unwrap();
        assert_eq!(agent.value(&winning_state, Action::new(0, 2).unwrap()), 0.5);
        // Two earlier transitions bootstrapped from zero-valued successors
        assert_eq!(agent.q_table().size(), 3);
        assert_eq!(agent.metadata().updates, 3);
        assert_eq!(agent.metadata().episodes, 1);
    }

    #[test]
    fn test_training_session_penalizes_loss() {
        let mut agent = greedy_agent();
        {
            let mut session = Session::training(&mut agent, Player::O, Player::X);
            session.opponent_move(1, 0).unwrap();
            // Agent takes (0,0) by tie-break
            session.agent_move().unwrap();
            session.opponent_move(1, 1).unwrap();
            // Agent takes (0,1)
            session.agent_move().unwrap();
            session.opponent_move(1, 2).unwrap();
            assert_eq!(session.outcome(), Some(GameOutcome::Win(Player::X)));
        }

        let last_state = StateKey::parse("O--XX----").unwrap();
        assert_eq!(agent.value(&last_state, Action::new(0, 1).unwrap()), -0.5);
    }

    /// X opens at (0,0), the agent (O) answers with `reply`, and X takes the
    /// first empty cell. Every action in the resulting state gets a distinct
    /// value, increasing in row-major order.
    fn seed_successor_values(agent: &mut TdAgent, reply: Action) {
        let mut game = Game::new();
        game.apply_move(0, 0, Player::X).unwrap();
        game.play(reply, Player::O).unwrap();
        let scripted = game.legal_actions()[0];
        game.play(scripted, Player::X).unwrap();

        let state = game.state_key();
        for (i, action) in game.legal_actions().into_iter().enumerate() {
            let mut after = game.clone();
            after.play(action, Player::O).unwrap();
            let reward = (i + 1) as f64 / 10.0;
            agent
                .update(&Transition::terminal(&state, action, reward, &after.state_key()))
                .unwrap();
        }
    }

    /// Drive one exploring agent through two of its own moves and return
    /// (Q(s,a) after the first transition, Q(s',a') for the action taken,
    /// max Q(s',·)).
    fn two_exploring_moves(algorithm: TdAlgorithm, seed: u64) -> (f64, f64, f64) {
        let config = AgentConfig::new(0.5, 0.9, 1.0).unwrap().with_seed(seed);
        let mut agent = TdAgent::new(algorithm, config);
        for reply in StateKey::parse("X--------").unwrap().empty_actions() {
            seed_successor_values(&mut agent, reply);
        }

        let mut session = Session::training(&mut agent, Player::O, Player::X);
        session.opponent_move(0, 0).unwrap();
        let state = session.game().state_key();
        let first = session.agent_move().unwrap();
        let scripted = session.game().legal_actions()[0];
        session.opponent_move(scripted.row, scripted.col).unwrap();
        let next_state = session.game().state_key();
        let next = session.agent_move().unwrap();

        let agent = session.agent();
        let max_next = agent
            .q_table()
            .max_q(&next_state, &next_state.empty_actions());
        (
            agent.value(&state, first),
            agent.value(&next_state, next),
            max_next,
        )
    }

    #[test]
    fn test_sarsa_session_bootstraps_from_action_taken() {
        let (alpha, gamma) = (0.5, 0.9);
        let mut explored = 0;
        for seed in 0..20 {
            let (sarsa_value, taken, max_next) = two_exploring_moves(TdAlgorithm::Sarsa, seed);
            assert!((sarsa_value - alpha * gamma * taken).abs() < 1e-12, "seed {seed}");

            let (q_value, _, q_max_next) = two_exploring_moves(TdAlgorithm::QLearning, seed);
            assert!((q_value - alpha * gamma * q_max_next).abs() < 1e-12, "seed {seed}");

            if taken < max_next {
                assert!(sarsa_value < alpha * gamma * max_next, "seed {seed}");
                explored += 1;
            }
        }
        // Six legal actions with ε = 1; the max is picked about 1 time in 6
        assert!(explored > 0);
    }
}
