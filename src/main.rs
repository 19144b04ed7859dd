//! # plm - Plantation field-operations CLI
//!
//! A command-line and terminal tool for running field work on an oil palm
//! plantation: the task board, worker recommendation, staged task assignment
//! and the phase/block/tree planting records.
//!
//! ## Key Features
//!
//! - **Task Board**: status tabs and live search over title, description and assignee
//! - **Worker Recommendation**: workers whose expertise covers the chosen task type
//! - **Assignment Staging**: draft, stage several assignments, then confirm them together
//! - **Planting Records**: Phase -> Block -> Tree forms, each step seeding the next
//! - **Multiple Interfaces**: one-shot CLI commands plus an interactive TUI
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! plm ui
//!
//! # List pending tasks mentioning "block c"
//! plm list --status pending --query "block c"
//!
//! # Who can do the spraying?
//! plm recommend Spraying
//!
//! # Create and assign a task
//! plm assign --category Spraying --priority high --start 2024-12-01 \
//!     --end 2024-12-02 --area "Block C" --worker w3
//! ```
//!
//! Nothing is stored between runs. Every session starts from the built-in
//! seed or from the JSON file given with `--seed` (or `PLM_SEED`); use
//! `plm export -o file.json` to keep a snapshot that can seed a later session.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod planting;
pub mod search;
pub mod staging;
pub mod task;
pub mod tui {
    pub mod colors;
    pub mod app;
    pub mod assign_form;
    pub mod enums;
    pub mod input;
    pub mod planting_form;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use db::*;
use error::Result;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let tui = matches!(cli.command, Commands::Ui);
    init_logging(cli.verbose, cli.log_file.as_deref(), tui)?;

    // Commands that don't need a session
    if let Commands::Completions { shell } = cli.command {
        return cmd_completions(shell);
    }

    let mut db = match cli.seed.as_deref() {
        Some(path) => Database::load(path)?,
        None => Database::default(),
    };

    match cli.command {
        Commands::Ui => cmd_ui(db),
        Commands::List { query, status, limit, json } => cmd_list(&db, query, status, limit, json),
        Commands::View { id } => cmd_view(&db, id),
        Commands::Workers => cmd_workers(&db),
        Commands::Recommend { category } => cmd_recommend(&db, category),
        Commands::Catalog => cmd_catalog(&db),
        Commands::Assign { category, priority, start, end, area, worker } =>
            cmd_assign(&mut db, category, priority, start, end, area, worker),
        Commands::Plant { draft } => cmd_plant(&mut db, &draft),
        Commands::Export { output } => cmd_export(&db, output),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Install the global subscriber.
///
/// Level comes from `-v` unless `RUST_LOG` is set. The terminal UI owns the
/// screen, so without `--log-file` its logs are dropped.
fn init_logging(verbose: u8, log_file: Option<&Path>, tui: bool) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if tui => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
