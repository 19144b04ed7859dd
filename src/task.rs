//! Task, worker and pending-assignment data structures.
//!
//! Field names serialize in camelCase, the shape the field screens hand to
//! each other (`assignedTo`, `startDate`, ...).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of field work on the plantation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub assigned_to: String,
    pub assigned_to_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub area: String,
}

/// A member of the field crew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub expertise: Vec<String>,
    pub availability: Availability,
    pub experience_years: u32,
}

impl Worker {
    /// Exact-match membership test on the expertise tags.
    pub fn has_expertise(&self, category: &str) -> bool {
        self.expertise.iter().any(|e| e == category)
    }
}

/// One drafted, not yet committed task-to-worker binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAssignment {
    pub id: String,
    pub task_type: String,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub area: String,
    pub worker: Worker,
}

impl PendingAssignment {
    /// Project the draft into a fresh task record.
    pub fn to_task(&self) -> Task {
        Task {
            id: self.id.clone(),
            title: format!("{} - {}", self.task_type, self.area),
            description: String::new(),
            status: Status::Pending,
            priority: self.priority,
            assigned_to: self.worker.name.clone(),
            assigned_to_id: self.worker.id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            progress: 0,
            asset_id: None,
            asset_name: None,
            category: self.task_type.clone(),
            area: self.area.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siti() -> Worker {
        Worker {
            id: "w3".into(),
            name: "Siti".into(),
            expertise: vec!["Spraying".into(), "Manuring".into()],
            availability: Availability::Busy,
            experience_years: 4,
        }
    }

    #[test]
    fn test_pending_assignment_projects_to_pending_task() {
        let pending = PendingAssignment {
            id: "5-w3".into(),
            task_type: "Spraying".into(),
            priority: Priority::High,
            start_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 2).unwrap(),
            area: "Block C".into(),
            worker: siti(),
        };
        let task = pending.to_task();
        assert_eq!(task.title, "Spraying - Block C");
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.assigned_to, "Siti");
        assert_eq!(task.assigned_to_id, "w3");
        assert_eq!(task.category, "Spraying");
    }

    #[test]
    fn test_task_wire_format_is_camel_case() {
        let json = r#"{
            "id": "9", "title": "Check", "status": "Pending", "priority": "Low",
            "assignedTo": "Ali", "assignedToId": "w4",
            "startDate": "2024-12-01", "endDate": "2024-12-02"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.assigned_to_id, "w4");
        assert_eq!(task.description, "");
        assert_eq!(task.progress, 0);
        assert!(task.asset_id.is_none());
    }

    #[test]
    fn test_expertise_is_exact_match() {
        let w = siti();
        assert!(w.has_expertise("Spraying"));
        assert!(!w.has_expertise("spraying"));
        assert!(!w.has_expertise(""));
    }
}
