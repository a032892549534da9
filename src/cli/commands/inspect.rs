//! Inspect command - Summarize a saved agent

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::{App, DEFAULT_AGENT_PATH},
    cli::output::{format_number, print_kv, print_section, print_subsection},
    q_learning::TdAgent,
    types::{Action, StateKey},
};

#[derive(Parser, Debug)]
#[command(about = "Show a saved agent's settings and its highest-valued entries")]
pub struct InspectArgs {
    /// Path to the saved agent
    #[arg(long, default_value = DEFAULT_AGENT_PATH)]
    pub agent: PathBuf,

    /// Number of top entries to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// The `n` highest-valued entries, best first. Equal values keep table order.
pub(crate) fn top_entries(agent: &TdAgent, n: usize) -> Vec<(&StateKey, Action, f64)> {
    let mut entries: Vec<_> = agent.q_table().iter().collect();
    entries.sort_by(|a, b| b.2.total_cmp(&a.2));
    entries.truncate(n);
    entries
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let agent = App::new()
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    let config = agent.config();
    let metadata = agent.metadata();

    print_section(&format!("Agent {}", args.agent.display()));
    print_kv("Algorithm", agent.name());
    print_kv("Learning rate", config.learning_rate());
    print_kv("Discount factor", config.discount_factor());
    print_kv("Epsilon", format!("{:.4}", agent.epsilon()));
    print_kv(
        "Epsilon decay",
        format!("{} (min {})", config.epsilon_decay(), config.min_epsilon()),
    );
    if let Some(seed) = config.seed() {
        print_kv("Seed", seed);
    }
    print_kv("Episodes", format_number(metadata.episodes as usize));
    print_kv("Updates", format_number(metadata.updates as usize));
    print_kv("Table entries", format_number(agent.q_table().size()));
    print_kv(
        "States",
        format_number(agent.q_table().state_keys().len()),
    );

    let top = top_entries(&agent, args.top);
    if !top.is_empty() {
        print_subsection(&format!("Top {} entries", top.len()));
        for (state, action, value) in top {
            println!("  {state}  {action}  {value:+.4}");
        }
    }

    Ok(())
}
