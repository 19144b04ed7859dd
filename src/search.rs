//! Task search and worker recommendation.
//!
//! Both are pure, order-preserving filters over borrowed slices. There is no
//! ranking: a worker's availability or experience never changes whether or
//! where it appears.

use tracing::debug;

use crate::fields::StatusFilter;
use crate::task::{Task, Worker};

/// Narrow `tasks` to those matching `query` and `status`.
///
/// `query` is a case-insensitive substring test against title, description
/// and assignee name; an empty query matches everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &str, status: StatusFilter) -> Vec<&'a Task> {
    let needle = query.to_lowercase();
    let matched: Vec<&Task> = tasks
        .iter()
        .filter(|t| status.matches(t.status) && matches_query(t, &needle))
        .collect();
    debug!(query, status = status.label(), matched = matched.len(), "filtered tasks");
    matched
}

fn matches_query(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.assigned_to.to_lowercase().contains(needle)
}

/// Workers whose expertise contains `category`, in roster order.
pub fn recommend<'a>(workers: &'a [Worker], category: &str) -> Vec<&'a Worker> {
    if category.is_empty() {
        return Vec::new();
    }
    let picked: Vec<&Worker> = workers.iter().filter(|w| w.has_expertise(category)).collect();
    debug!(category, recommended = picked.len(), "recommended workers");
    picked
}
