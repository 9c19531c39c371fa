//! ReelForge Round Replay
//!
//! Usage:
//!   rf-round-replay --list                      - List built-in scripts
//!   rf-round-replay --preset cascade_chain      - Replay a built-in script
//!   rf-round-replay --script rounds.json        - Replay a script file
//!   rf-round-replay --script rounds.json --description machine.yaml --pretty

mod replay;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use rf_slot_round::{MachineOptions, RoundParserConfig, all_presets, preset};

use crate::replay::{ReplayOptions, load_script, replay, resolve_description};

#[derive(Parser)]
#[command(name = "rf-round-replay", about = "Replay scripted slot rounds")]
struct Cli {
    /// Round script file (JSON)
    #[arg(short, long, conflicts_with = "preset")]
    script: Option<PathBuf>,

    /// Built-in script id
    #[arg(short, long)]
    preset: Option<String>,

    /// List built-in scripts and exit
    #[arg(long)]
    list: bool,

    /// Machine description (JSON or YAML); defaults to the script's machine preset
    #[arg(short, long)]
    description: Option<PathBuf>,

    /// Wallet denomination
    #[arg(long, default_value_t = 1.0)]
    denomination: f64,

    /// Continuation transacts allowed per round
    #[arg(long, default_value_t = 64)]
    max_cascade_steps: usize,

    /// Bet multiplier (1-10)
    #[arg(long, default_value_t = 1)]
    bet_quantity: i32,

    /// Pretty-print the trace
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for script in all_presets() {
            println!("{:<20} {}", script.id, script.description);
        }
        return Ok(());
    }

    let script = match (&cli.script, &cli.preset) {
        (Some(path), _) => load_script(path)?,
        (None, Some(id)) => preset(id).with_context(|| format!("Unknown preset '{id}'"))?,
        (None, None) => bail!("Pass --script, --preset or --list"),
    };
    let description = resolve_description(&script, cli.description.as_deref())?;

    let options = ReplayOptions {
        parser: RoundParserConfig {
            denomination: cli.denomination,
            max_cascade_steps: cli.max_cascade_steps,
        },
        machine: MachineOptions::default(),
        bet_quantity: cli.bet_quantity,
    };
    let trace = replay(&script, description, &options).await?;

    let validation = trace.validate();
    for warning in validation.warnings() {
        log::warn!("{warning}");
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&trace)?
    } else {
        serde_json::to_string(&trace)?
    };
    println!("{json}");

    Ok(())
}
