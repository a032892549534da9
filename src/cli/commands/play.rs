//! Play command - A terminal match against a saved agent
//!
//! The human is `X` and the agent is `O`. Moves are entered as `row col`
//! with zero-based indices.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::{
    Error,
    app::{AgentConfig, App, DEFAULT_AGENT_PATH},
    pipeline::Session,
    q_learning::{TdAgent, TdAlgorithm},
    tictactoe::{GameOutcome, Player},
};

const HUMAN: Player = Player::X;
const AGENT: Player = Player::O;

#[derive(Parser, Debug)]
#[command(about = "Play against a trained agent")]
pub struct PlayArgs {
    /// Path to the saved agent
    #[arg(long, default_value = DEFAULT_AGENT_PATH)]
    pub agent: PathBuf,

    /// Who opens each game
    #[arg(long, value_enum, default_value_t = FirstMover::Human)]
    pub first: FirstMover,

    /// Let the agent learn from the match and save it afterwards
    #[arg(long, default_value_t = false)]
    pub learn: bool,
}

/// Who makes the opening move of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FirstMover {
    Human,
    Agent,
}

impl FirstMover {
    fn mark(self) -> Player {
        match self {
            FirstMover::Human => HUMAN,
            FirstMover::Agent => AGENT,
        }
    }
}

/// What the player typed at the move prompt
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Move(usize, usize),
    Quit,
}

fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let trimmed = line.trim();
    if matches!(trimmed, "q" | "quit" | "exit") {
        return Ok(Input::Quit);
    }
    let parts: Vec<&str> = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [row, col] => {
            let row = row
                .parse()
                .map_err(|_| format!("'{row}' is not a row number"))?;
            let col = col
                .parse()
                .map_err(|_| format!("'{col}' is not a column number"))?;
            Ok(Input::Move(row, col))
        }
        _ => Err("enter a move as `row col`, e.g. `1 1`, or `q` to quit".to_string()),
    }
}

fn print_board<W: Write>(out: &mut W, session: &Session<'_>) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "    0 1 2")?;
    for (row, line) in session.game().board().to_string().lines().enumerate() {
        writeln!(out, "  {row} {line}")?;
    }
    writeln!(out)
}

/// Play one match on `input`/`out`. Returns `None` if the player quit.
pub(crate) fn play_match<R: BufRead, W: Write>(
    agent: &mut TdAgent,
    first: Player,
    learn: bool,
    input: &mut R,
    out: &mut W,
) -> Result<Option<GameOutcome>> {
    let mut session = if learn {
        Session::training(agent, AGENT, first)
    } else {
        Session::new(agent, AGENT, first)
    };

    print_board(out, &session)?;
    loop {
        if let Some(outcome) = session.outcome() {
            let message = match outcome {
                GameOutcome::Win(HUMAN) => "You win!",
                GameOutcome::Win(_) => "The agent wins.",
                GameOutcome::Draw => "It's a draw.",
            };
            writeln!(out, "{message}")?;
            return Ok(Some(outcome));
        }

        if session.is_agent_turn() {
            let action = session.agent_move()?;
            writeln!(out, "Agent plays {action}")?;
            print_board(out, &session)?;
            continue;
        }

        write!(out, "Your move (row col): ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match parse_input(&line) {
            Ok(Input::Quit) => return Ok(None),
            Ok(Input::Move(row, col)) => match session.opponent_move(row, col) {
                Ok(()) => print_board(out, &session)?,
                Err(err @ (Error::IllegalMove { .. } | Error::OutOfBounds { .. })) => {
                    writeln!(out, "{err}")?;
                }
                Err(err) => return Err(err.into()),
            },
            Err(message) => writeln!(out, "{message}")?,
        }
    }
}

fn ask_again<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Play again? [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let app = App::new();
    let mut agent = app
        .load_or_create(&args.agent, TdAlgorithm::QLearning, AgentConfig::default())
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    let first = args.first.mark();

    println!(
        "You are '{HUMAN}' and the agent is '{AGENT}' ({}, {} table entries).",
        agent.name(),
        agent.q_table().size()
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    loop {
        let outcome = play_match(&mut agent, first, args.learn, &mut input, &mut out)?;
        if outcome.is_none() || !ask_again(&mut input, &mut out)? {
            break;
        }
    }

    if args.learn {
        app.save_agent(&agent, &args.agent)
            .with_context(|| format!("Failed to save agent to {}", args.agent.display()))?;
        println!("Saved agent to {}", args.agent.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn greedy_agent() -> TdAgent {
        TdAgent::q_learning(AgentConfig::new(0.5, 0.9, 0.0).unwrap())
    }

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: PlayArgs,
    }

    fn parse(argv: &[&str]) -> PlayArgs {
        Wrapper::parse_from(std::iter::once("play").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_first_mover_flag() {
        assert_eq!(parse(&[]).first.mark(), HUMAN);
        assert_eq!(parse(&["--first", "agent"]).first.mark(), AGENT);
        assert_eq!(parse(&["--first", "human"]).first.mark(), HUMAN);
        assert!(Wrapper::try_parse_from(["play", "--first", "nobody"]).is_err());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("1 2\n"), Ok(Input::Move(1, 2)));
        assert_eq!(parse_input("0,0"), Ok(Input::Move(0, 0)));
        assert_eq!(parse_input("q"), Ok(Input::Quit));
        assert!(parse_input("middle").is_err());
        assert!(parse_input("1 x").is_err());
    }

    #[test]
    fn test_human_wins_scripted_match() {
        // The greedy agent answers (0,0), (0,1) by tie-break; the human takes
        // the middle row. A bad line and an occupied cell are reprompted.
        let mut agent = greedy_agent();
        let mut input = Cursor::new("hello\n1 0\n0 0\n1 1\n1 2\n");
        let mut out = Vec::new();

        let outcome = play_match(&mut agent, HUMAN, false, &mut input, &mut out).unwrap();
        assert_eq!(outcome, Some(GameOutcome::Win(Player::X)));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("enter a move"));
        assert!(text.contains("already occupied"));
        assert!(text.contains("You win!"));
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_learning_match_updates_agent() {
        let mut agent = greedy_agent();
        let mut input = Cursor::new("1 0\n1 1\n1 2\n");
        let mut out = Vec::new();

        play_match(&mut agent, HUMAN, true, &mut input, &mut out).unwrap();
        assert_eq!(agent.metadata().episodes, 1);
        assert!(!agent.q_table().is_empty());
    }

    #[test]
    fn test_quit_and_eof() {
        let mut agent = greedy_agent();
        let mut out = Vec::new();
        let quit = play_match(&mut agent, HUMAN, false, &mut Cursor::new("q\n"), &mut out);
        assert_eq!(quit.unwrap(), None);
        let eof = play_match(&mut agent, AGENT, false, &mut Cursor::new(""), &mut out);
        assert_eq!(eof.unwrap(), None);
    }
}
