use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Plantation field-operations CLI.
/// Sessions start from the built-in seed, or from a JSON seed passed via --seed.
#[derive(Parser)]
#[command(name = "plm", version, about = "Plantation task board and planting records")]
pub struct Cli {
    /// Path to a JSON seed file (tasks, workers, taskTypes, areas).
    #[arg(long, global = true, env = "PLM_SEED")]
    pub seed: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file (the terminal UI otherwise discards them).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
