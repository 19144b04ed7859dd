//! Session store and utility functions for plantation tasks.
//!
//! This module provides the `Database` struct that holds the task store, the
//! worker roster, the task-type and area catalogues and the planting areas
//! recorded during the session, along with date parsing and table
//! formatting helpers shared by the CLI and the TUI.
//!
//! Nothing is persisted between runs. A session starts from the built-in
//! seed or from a JSON seed file and can be exported as a new seed file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fields::*;
use crate::planting::AreaRecord;
use crate::task::{Task, Worker};

/// Task types offered by the assignment form.
pub const TASK_TYPES: [&str; 7] = [
    "Harvesting",
    "Pruning",
    "Spraying",
    "Manuring",
    "Weeding",
    "Pest & Disease",
    "Mechanisation Fleet",
];

/// Areas offered by the assignment form.
pub const AREAS: [&str; 4] = ["Block A", "Block B", "Block C", "Block D"];

/// In-memory store for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub tasks: Vec<Task>,
    pub workers: Vec<Worker>,
    pub task_types: Vec<String>,
    pub areas: Vec<String>,
    pub planted_areas: Vec<AreaRecord>,
}

/// On-disk seed layout. Every section is optional and falls back to the
/// built-in data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Seed {
    tasks: Option<Vec<Task>>,
    workers: Option<Vec<Worker>>,
    task_types: Option<Vec<String>>,
    areas: Option<Vec<String>>,
    #[serde(default)]
    planted_areas: Vec<AreaRecord>,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            tasks: default_tasks(),
            workers: default_workers(),
            task_types: TASK_TYPES.iter().map(|s| s.to_string()).collect(),
            areas: AREAS.iter().map(|s| s.to_string()).collect(),
            planted_areas: Vec::new(),
        }
    }
}

impl Database {
    /// Load a session seed from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path)?;
        let db = Self::from_json(&buf)?;
        info!(
            path = %path.display(),
            tasks = db.tasks.len(),
            workers = db.workers.len(),
            "loaded seed"
        );
        Ok(db)
    }

    /// Parse and validate a seed document.
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: Seed = serde_json::from_str(json)?;
        let defaults = Database::default();
        let db = Database {
            tasks: seed.tasks.unwrap_or(defaults.tasks),
            workers: seed.workers.unwrap_or(defaults.workers),
            task_types: seed.task_types.unwrap_or(defaults.task_types),
            areas: seed.areas.unwrap_or(defaults.areas),
            planted_areas: seed.planted_areas,
        };
        db.validate()?;
        Ok(db)
    }

    /// Reject seeds that break the store's invariants.
    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for t in &self.tasks {
            if !ids.insert(t.id.as_str()) {
                return Err(Error::InvalidInput(format!("duplicate task id '{}'", t.id)));
            }
            if t.progress > 100 {
                return Err(Error::InvalidInput(format!(
                    "task '{}' has progress {} (expected 0-100)",
                    t.id, t.progress
                )));
            }
        }
        let mut worker_ids = HashSet::new();
        for w in &self.workers {
            if !worker_ids.insert(w.id.as_str()) {
                return Err(Error::InvalidInput(format!("duplicate worker id '{}'", w.id)));
            }
        }
        Ok(())
    }

    /// Write the session state as a seed file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        debug!(path = %path.display(), "saved session snapshot");
        Ok(())
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains_task_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Look a worker up by exact ID, falling back to a case-insensitive name match.
    pub fn worker(&self, id_or_name: &str) -> Option<&Worker> {
        self.workers
            .iter()
            .find(|w| w.id == id_or_name)
            .or_else(|| {
                let wanted = id_or_name.to_lowercase();
                self.workers.iter().find(|w| w.name.to_lowercase() == wanted)
            })
    }

    /// Put newly committed tasks in front of the existing ones, keeping their order.
    pub fn prepend(&mut self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        info!(count = tasks.len(), "prepending committed tasks");
        let mut merged = tasks;
        merged.append(&mut self.tasks);
        self.tasks = merged;
    }

    /// Keep a finished planting area for the rest of the session.
    pub fn add_area(&mut self, area: AreaRecord) {
        info!(block = %area.block.block_name, trees = area.trees.len(), "recorded planting area");
        self.planted_areas.push(area);
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn default_tasks() -> Vec<Task> {
    let task = |id: &str,
                title: &str,
                description: &str,
                status: Status,
                priority: Priority,
                who: (&str, &str),
                dates: (NaiveDate, NaiveDate),
                progress: u8,
                asset: (&str, &str),
                category: &str,
                area: &str| Task {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        status,
        priority,
        assigned_to: who.0.into(),
        assigned_to_id: who.1.into(),
        start_date: dates.0,
        end_date: dates.1,
        progress,
        asset_id: Some(asset.0.into()),
        asset_name: Some(asset.1.into()),
        category: category.into(),
        area: area.into(),
    };
    vec![
        task(
            "1",
            "Tree Pruning - Block A",
            "Prune apple trees in the northern section of Block A",
            Status::InProgress,
            Priority::High,
            ("John Smith", "worker1"),
            (date(2024, 11, 29), date(2024, 12, 1)),
            65,
            ("asset1", "Pruning Shears Set"),
            "Maintenance",
            "Block A",
        ),
        task(
            "2",
            "Irrigation System Check",
            "Inspect and test all irrigation lines in Block B",
            Status::Pending,
            Priority::Medium,
            ("Maria Garcia", "worker2"),
            (date(2024, 12, 2), date(2024, 12, 3)),
            0,
            ("asset2", "Irrigation Controller"),
            "Inspection",
            "Block B",
        ),
        task(
            "3",
            "Pest Control - Block C",
            "Spray pesticides to control pests in Block C",
            Status::Pending,
            Priority::High,
            ("Ahmad", "w1"),
            (date(2024, 12, 4), date(2024, 12, 5)),
            0,
            ("asset3", "Sprayer"),
            "Pest & Disease",
            "Block C",
        ),
        task(
            "4",
            "Fertilizer Application - Block D",
            "Apply organic fertilizer to trees in Block D",
            Status::InProgress,
            Priority::Medium,
            ("Siti", "w3"),
            (date(2024, 12, 5), date(2024, 12, 6)),
            40,
            ("asset4", "Fertilizer Spreaders"),
            "Manuring",
            "Block D",
        ),
    ]
}

fn default_workers() -> Vec<Worker> {
    let worker = |id: &str, name: &str, expertise: &[&str], availability, years| Worker {
        id: id.into(),
        name: name.into(),
        expertise: expertise.iter().map(|e| e.to_string()).collect(),
        availability,
        experience_years: years,
    };
    vec![
        worker("w1", "Ahmad", &["Harvesting", "Pruning"], Availability::Available, 5),
        worker("w2", "Faiz", &["Harvesting"], Availability::Available, 3),
        worker("w3", "Siti", &["Spraying", "Manuring"], Availability::Busy, 4),
        worker("w4", "Ali", &["Weeding", "Pest & Disease"], Availability::Available, 2),
        worker("w5", "Hana", &["Mechanisation Fleet"], Availability::Available, 6),
    ]
}

/// Parse human-readable date input relative to the local date.
///
/// See [`parse_date_input_from`] for the accepted forms.
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    parse_date_input_from(s, Local::now().date_naive())
}

/// Parse human-readable date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday", "next monday", "this friday", ...
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_date_input_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "" => return None,
        "today" => return Some(today),
        "tomorrow" => return shift_days(today, 1),
        "yesterday" => return shift_days(today, -1),
        "end of week" | "eow" => return Some(start_end_of_week(today).1),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            return NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| shift_days(d, -1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return shift_days(today, n);
        }
        if let Some(n) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return n.checked_mul(7).and_then(|days| shift_days(today, days));
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let ahead = (target + 7 - current) % 7;
        if s == name || s == format!("this {name}") {
            return shift_days(today, ahead);
        }
        if s == format!("next {name}") {
            let days = if ahead == 0 { 7 } else { ahead + 7 };
            return shift_days(today, days);
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// `day` moved by `days`, or `None` when the result leaves the calendar range.
fn shift_days(day: NaiveDate, days: i64) -> Option<NaiveDate> {
    day.checked_add_signed(Duration::try_days(days)?)
}

/// Start and end dates of the ISO week (Monday to Sunday) containing `day`.
pub fn start_end_of_week(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = day.weekday().num_days_from_monday() as i64;
    let start = day - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format an end date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_end_relative(end: NaiveDate, today: NaiveDate) -> String {
    let days = (end - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Print tasks as a fixed-width table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<8} {:<12} {:<7} {:<11} {:<11} {:<9} {:<14} {}",
        "ID", "Status", "Pri", "Start", "End", "Area", "Assignee", "Title"
    );
    for t in tasks {
        println!(
            "{:<8} {:<12} {:<7} {:<11} {:<11} {:<9} {:<14} {}",
            truncate(&t.id, 8),
            t.status.label(),
            t.priority.label(),
            t.start_date,
            t.end_date,
            truncate(&t.area, 9),
            truncate(&t.assigned_to, 14),
            t.title
        );
    }
}

/// Print workers as a fixed-width table.
pub fn print_workers(workers: &[&Worker]) {
    println!(
        "{:<6} {:<10} {:<10} {:<6} {}",
        "ID", "Name", "Status", "Exp", "Expertise"
    );
    for w in workers {
        println!(
            "{:<6} {:<10} {:<10} {:<6} {}",
            w.id,
            truncate(&w.name, 10),
            w.availability.label(),
            format!("{}y", w.experience_years),
            w.expertise.join(", ")
        );
    }
}
