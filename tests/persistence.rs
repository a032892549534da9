//! Save/load round-trips on disk and corruption handling

use std::fs;

use qttt::{
    Error,
    app::AgentConfig,
    pipeline::{OpponentKind, TrainingConfig, TrainingPipeline},
    q_learning::{SavedTdAgent, TdAgent, TdAlgorithm},
    tictactoe::Player,
};
use tempfile::tempdir;

fn trained_agent(algorithm: TdAlgorithm) -> TdAgent {
    let config = AgentConfig::new(0.4, 0.95, 0.3)
        .unwrap()
        .with_epsilon_decay(0.99, 0.05)
        .unwrap()
        .with_seed(21);
    let mut agent = TdAgent::new(algorithm, config);
    let mut opponent = OpponentKind::Defensive.build(None);
    TrainingPipeline::new(TrainingConfig {
        num_games: 200,
        seed: Some(21),
        agent_player: Player::O,
        first_player: Player::X,
        opponent: OpponentKind::Defensive,
    })
    .run(&mut agent, opponent.as_mut())
    .unwrap();
    agent
}

#[test]
fn test_roundtrip_preserves_greedy_policy() {
    for algorithm in [TdAlgorithm::QLearning, TdAlgorithm::Sarsa] {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q_agent.msgpack");

        let mut original = trained_agent(algorithm);
        assert!(!original.q_table().is_empty());
        original.save(&path).unwrap();

        let mut restored = TdAgent::load(&path).unwrap();
        assert_eq!(restored.algorithm(), algorithm);
        assert_eq!(restored.q_table(), original.q_table());
        assert_eq!(restored.epsilon(), original.epsilon());
        assert_eq!(restored.metadata(), original.metadata());
        assert_eq!(restored.config(), original.config());

        original.set_epsilon(0.0).unwrap();
        restored.set_epsilon(0.0).unwrap();
        let states: Vec<_> = original.q_table().state_keys().into_iter().cloned().collect();
        for state in states {
            let legal = state.empty_actions();
            assert_eq!(
                original.get_action(&state, &legal).unwrap(),
                restored.get_action(&state, &legal).unwrap(),
                "state {state}"
            );
        }
    }
}

#[test]
fn test_saved_bytes_are_deterministic() {
    let agent = trained_agent(TdAlgorithm::QLearning);
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.msgpack");
    let b = dir.path().join("b.msgpack");
    agent.save(&a).unwrap();
    TdAgent::load(&a).unwrap().save(&b).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn test_truncated_file_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.msgpack");
    trained_agent(TdAlgorithm::Sarsa).save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(
        TdAgent::load(&path),
        Err(Error::CorruptState { .. })
    ));
}

#[test]
fn test_garbage_file_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.msgpack");
    fs::write(&path, b"definitely not messagepack").unwrap();
    assert!(matches!(
        TdAgent::load(&path),
        Err(Error::CorruptState { .. })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        TdAgent::load(dir.path().join("nope.msgpack")),
        Err(Error::Io { .. })
    ));
}

#[test]
fn test_saved_blob_exposes_metadata() {
    let agent = trained_agent(TdAlgorithm::Sarsa);
    let bytes = SavedTdAgent::from_agent(&agent).to_bytes().unwrap();
    let saved = SavedTdAgent::from_bytes(&bytes).unwrap();
    assert_eq!(saved.algorithm(), TdAlgorithm::Sarsa);
    assert_eq!(saved.metadata().episodes, 200);
}
