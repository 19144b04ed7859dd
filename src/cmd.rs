//! Command implementations for the CLI interface.
//!
//! Each handler works on the session [`Database`] built in `main` and returns
//! a [`Result`]; `main` reports errors and sets the exit status.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::{info, warn};

use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::planting::{run_draft, PlantingDraft};
use crate::search::{filter_tasks, recommend};
use crate::staging::AssignmentStaging;
use crate::task::Task;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive terminal UI.
    Ui,

    /// List tasks with optional search and status filter.
    List {
        /// Case-insensitive text matched against title, description and assignee.
        #[arg(long, short)]
        query: Option<String>,
        /// Status tab: all | pending | in-progress | completed.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Print the matching tasks as JSON.
        #[arg(long)]
        json: bool,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view
        id: String,
    },

    /// Show the worker roster.
    Workers,

    /// Recommend workers for a task type.
    Recommend {
        /// Task type, e.g. "Harvesting". Matched exactly.
        category: String,
    },

    /// Show the task types and areas offered by the assignment form.
    Catalog,

    /// Create and assign a task to one worker.
    Assign {
        /// Task type.
        #[arg(long)]
        category: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "next monday".
        #[arg(long)]
        start: Option<String>,
        /// End date, same forms as --start.
        #[arg(long)]
        end: Option<String>,
        /// Area / block.
        #[arg(long)]
        area: Option<String>,
        /// Worker ID or name.
        #[arg(long)]
        worker: Option<String>,
    },

    /// Record a planted area from a JSON draft {phase, block, trees}.
    Plant {
        /// Path to the draft file.
        draft: PathBuf,
    },

    /// Write the session state as a seed file (stdout when no output is given).
    Export {
        /// Output file path.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn cmd_ui(db: Database) -> Result<()> {
    run_tui(db)
}

pub fn cmd_list(
    db: &Database,
    query: Option<String>,
    status: StatusFilter,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut filtered = filter_tasks(&db.tasks, query.as_deref().unwrap_or(""), status);
    if let Some(n) = limit {
        filtered.truncate(n);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
    } else if filtered.is_empty() {
        println!("No tasks found");
    } else {
        print_table(&filtered);
    }
    Ok(())
}

pub fn cmd_view(db: &Database, id: String) -> Result<()> {
    let task = db
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("task '{id}'")))?;
    print_task(task, Local::now().date_naive());
    Ok(())
}

fn print_task(task: &Task, today: NaiveDate) {
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", task.status.label());
    println!("Priority:     {}", task.priority.label());
    println!("Category:     {}", dash(&task.category));
    println!("Area:         {}", dash(&task.area));
    println!("Assigned to:  {} ({})", task.assigned_to, task.assigned_to_id);
    println!("Start:        {}", task.start_date);
    println!(
        "End:          {} ({})",
        task.end_date,
        format_end_relative(task.end_date, today)
    );
    println!("Progress:     {}%", task.progress);
    if let Some(asset) = &task.asset_name {
        println!("Asset:        {asset}");
    }
    println!("Description:\n{}\n", dash(&task.description));
}

fn dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

pub fn cmd_workers(db: &Database) -> Result<()> {
    let all: Vec<_> = db.workers.iter().collect();
    print_workers(&all);
    Ok(())
}

pub fn cmd_recommend(db: &Database, category: String) -> Result<()> {
    if !db.task_types.iter().any(|t| *t == category) {
        warn!(%category, "not a known task type");
    }
    let picked = recommend(&db.workers, &category);
    if picked.is_empty() {
        println!("No workers with expertise in {category}");
    } else {
        print_workers(&picked);
    }
    Ok(())
}

pub fn cmd_catalog(db: &Database) -> Result<()> {
    println!("Task types:");
    for t in &db.task_types {
        println!("  {t}");
    }
    println!("Areas:");
    for a in &db.areas {
        println!("  {a}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_assign(
    db: &mut Database,
    category: Option<String>,
    priority: Option<Priority>,
    start: Option<String>,
    end: Option<String>,
    area: Option<String>,
    worker: Option<String>,
) -> Result<()> {
    let mut staging = AssignmentStaging::new();
    if let Some(c) = category {
        staging = staging.with_category(c);
    }
    if let Some(p) = priority {
        staging = staging.with_priority(p);
    }
    if let Some(s) = start {
        staging = staging.with_start_date(parse_date_arg("--start", &s)?);
    }
    if let Some(e) = end {
        staging = staging.with_end_date(parse_date_arg("--end", &e)?);
    }
    if let Some(a) = area {
        staging = staging.with_area(a);
    }
    if let Some(w) = worker {
        let found = db
            .worker(&w)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("worker '{w}'")))?;
        if let Some(c) = staging.draft().category.as_deref() {
            if !found.has_expertise(c) {
                warn!(worker = %found.name, category = c, "worker is not recommended for this task type");
            }
        }
        staging = staging.with_worker(found);
    }

    let staging = staging.assign(db)?;
    let commit = staging.confirm_all();
    for task in &commit.tasks {
        println!("Created task {}: {} -> {}", task.id, task.title, task.assigned_to);
    }
    db.prepend(commit.tasks);
    println!("Workers assigned successfully!");
    println!();
    let all: Vec<&Task> = db.tasks.iter().collect();
    print_table(&all);
    Ok(())
}

fn parse_date_arg(flag: &str, value: &str) -> Result<NaiveDate> {
    parse_date_input(value)
        .ok_or_else(|| Error::InvalidInput(format!("{flag}: could not parse date '{value}'")))
}

pub fn cmd_plant(db: &mut Database, draft: &Path) -> Result<()> {
    let buf = fs::read_to_string(draft)?;
    let draft: PlantingDraft = serde_json::from_str(&buf)?;
    let area = run_draft(&draft)?;
    println!("{}", serde_json::to_string_pretty(&area)?);
    db.add_area(area);
    Ok(())
}

pub fn cmd_export(db: &Database, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            db.save(&path)?;
            info!(path = %path.display(), "exported session");
            println!("Exported {} task(s) to {}", db.tasks.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(db)?),
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) -> Result<()> {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
    Ok(())
}
