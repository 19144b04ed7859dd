//! Enumerations and field types for plantation tasks and workers.
//!
//! Serialized forms use the display labels ("In Progress") so seed files and
//! exported snapshots read the same as the field screens. On the command line
//! the kebab-case names are used (`in-progress`).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task progress status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "Pending", alias = "pending")]
    Pending,
    #[serde(rename = "In Progress", alias = "in-progress", alias = "InProgress")]
    InProgress,
    #[serde(rename = "Completed", alias = "completed")]
    Completed,
}

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(rename = "Low", alias = "low")]
    Low,
    #[serde(rename = "Medium", alias = "medium")]
    Medium,
    #[serde(rename = "High", alias = "high")]
    High,
}

/// Whether a worker is currently free to take on work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum Availability {
    #[serde(rename = "Available", alias = "available")]
    Available,
    #[serde(rename = "Busy", alias = "busy")]
    Busy,
}

/// Status tab on the task board. `All` is a wildcard.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Availability {
    pub fn label(self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Busy => "Busy",
        }
    }
}

impl StatusFilter {
    /// Tab order on the task board.
    pub const TABS: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::InProgress,
        StatusFilter::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::InProgress => "In Progress",
            StatusFilter::Completed => "Completed",
        }
    }

    /// True when a task with `status` passes this filter.
    pub fn matches(self, status: Status) -> bool {
        self == StatusFilter::All || self == StatusFilter::from(status)
    }

    /// Next tab, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::TABS.iter().position(|&f| f == self).unwrap_or(0);
        Self::TABS[(idx + 1) % Self::TABS.len()]
    }

    /// Previous tab, wrapping around.
    pub fn prev(self) -> Self {
        let idx = Self::TABS.iter().position(|&f| f == self).unwrap_or(0);
        Self::TABS[(idx + Self::TABS.len() - 1) % Self::TABS.len()]
    }
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => StatusFilter::Pending,
            Status::InProgress => StatusFilter::InProgress,
            Status::Completed => StatusFilter::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_with_display_label() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: Status = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn test_filter_all_is_wildcard() {
        for s in [Status::Pending, Status::InProgress, Status::Completed] {
            assert!(StatusFilter::All.matches(s));
            assert!(StatusFilter::from(s).matches(s));
        }
        assert!(!StatusFilter::Pending.matches(Status::Completed));
    }

    #[test]
    fn test_filter_tabs_wrap() {
        assert_eq!(StatusFilter::Completed.next(), StatusFilter::All);
        assert_eq!(StatusFilter::All.prev(), StatusFilter::Completed);
    }
}
