//! Assignment staging for the "Create & Assign" flow.
//!
//! An [`AssignmentStaging`] is a plain value: every edit returns a new value
//! and leaves the old one untouched, so a failed `assign` can never leave a
//! half-built draft or a partially extended staging list behind.
//!
//! Worker selection is single: choosing a worker replaces the previous
//! choice. `assign` therefore always stages exactly one assignment.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{FormKind, ValidationError};
use crate::fields::Priority;
use crate::task::{PendingAssignment, Task, Worker};

/// Field labels as shown on the assignment form.
pub const CATEGORY_LABEL: &str = "Task Type";
pub const PRIORITY_LABEL: &str = "Priority";
pub const START_LABEL: &str = "Start Date";
pub const END_LABEL: &str = "End Date";
pub const AREA_LABEL: &str = "Area / Block";
pub const WORKER_LABEL: &str = "Worker";

/// Progress of the draft toward a stageable assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    /// No draft field set.
    Empty,
    /// Some, but not all, draft fields set.
    Building,
    /// Every draft field set; `assign` will succeed.
    Ready,
    /// The last operation committed the staged list; nothing edited since.
    Committed,
}

/// The single-assignment form being filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentDraft {
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub area: Option<String>,
    pub worker: Option<Worker>,
}

impl AssignmentDraft {
    fn is_empty(&self) -> bool {
        *self == AssignmentDraft::default()
    }

    /// Labels of the fields still unset. Blank strings count as unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.category) {
            missing.push(CATEGORY_LABEL);
        }
        if self.priority.is_none() {
            missing.push(PRIORITY_LABEL);
        }
        if self.start_date.is_none() {
            missing.push(START_LABEL);
        }
        if self.end_date.is_none() {
            missing.push(END_LABEL);
        }
        if blank(&self.area) {
            missing.push(AREA_LABEL);
        }
        if self.worker.is_none() {
            missing.push(WORKER_LABEL);
        }
        missing
    }
}

/// Draft form plus the list of assignments staged so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentStaging {
    draft: AssignmentDraft,
    staged: Vec<PendingAssignment>,
    committed: bool,
}

/// Result of confirming the staged list.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// New tasks, in staging order, ready to be prepended to the store.
    pub tasks: Vec<Task>,
    /// The emptied staging value.
    pub staging: AssignmentStaging,
}

impl AssignmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &AssignmentDraft {
        &self.draft
    }

    pub fn staged(&self) -> &[PendingAssignment] {
        &self.staged
    }

    pub fn state(&self) -> StagingState {
        if self.draft.is_empty() {
            if self.committed {
                StagingState::Committed
            } else {
                StagingState::Empty
            }
        } else if self.draft.missing_fields().is_empty() {
            StagingState::Ready
        } else {
            StagingState::Building
        }
    }

    fn edit(&self, f: impl FnOnce(&mut AssignmentDraft)) -> Self {
        let mut next = self.clone();
        f(&mut next.draft);
        next.committed = false;
        next
    }

    pub fn with_category(&self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.edit(|d| d.category = Some(category))
    }

    pub fn with_priority(&self, priority: Priority) -> Self {
        self.edit(|d| d.priority = Some(priority))
    }

    pub fn with_start_date(&self, date: NaiveDate) -> Self {
        self.edit(|d| d.start_date = Some(date))
    }

    pub fn with_end_date(&self, date: NaiveDate) -> Self {
        self.edit(|d| d.end_date = Some(date))
    }

    pub fn with_area(&self, area: impl Into<String>) -> Self {
        let area = area.into();
        self.edit(|d| d.area = Some(area))
    }

    /// Select `worker`, replacing any earlier selection.
    pub fn with_worker(&self, worker: Worker) -> Self {
        self.edit(|d| d.worker = Some(worker))
    }

    pub fn clear_start_date(&self) -> Self {
        self.edit(|d| d.start_date = None)
    }

    pub fn clear_end_date(&self) -> Self {
        self.edit(|d| d.end_date = None)
    }

    /// Stage the current draft.
    ///
    /// Fails with a [`ValidationError`] unless every draft field is set; on
    /// success the returned value holds one more staged assignment and an
    /// empty draft.
    pub fn assign(&self, db: &Database) -> Result<Self, ValidationError> {
        let missing = self.draft.missing_fields();
        let (category, priority, start, end, area, worker) = match (
            self.draft.category.clone(),
            self.draft.priority,
            self.draft.start_date,
            self.draft.end_date,
            self.draft.area.clone(),
            self.draft.worker.clone(),
        ) {
            (Some(c), Some(p), Some(s), Some(e), Some(a), Some(w)) if missing.is_empty() => {
                (c, p, s, e, a, w)
            }
            _ => {
                warn!(?missing, "assignment rejected");
                return Err(ValidationError::new(FormKind::Assignment, missing));
            }
        };

        let id = self.next_id(db, &worker.id);
        debug!(%id, worker = %worker.name, %category, "staged assignment");
        let mut staged = self.staged.clone();
        staged.push(PendingAssignment {
            id,
            task_type: category,
            priority,
            start_date: start,
            end_date: end,
            area,
            worker,
        });
        Ok(AssignmentStaging {
            draft: AssignmentDraft::default(),
            staged,
            committed: false,
        })
    }

    /// `"{n}-{worker_id}"` where n counts the store plus staging, bumped
    /// until the id is free.
    fn next_id(&self, db: &Database, worker_id: &str) -> String {
        let mut n = db.tasks.len() + self.staged.len() + 1;
        loop {
            let id = format!("{n}-{worker_id}");
            if !db.contains_task_id(&id) && !self.staged.iter().any(|p| p.id == id) {
                return id;
            }
            n += 1;
        }
    }

    /// Project every staged assignment into a new task and empty the staging list.
    pub fn confirm_all(&self) -> Commit {
        let tasks: Vec<Task> = self.staged.iter().map(PendingAssignment::to_task).collect();
        info!(count = tasks.len(), "confirmed staged assignments");
        Commit {
            tasks,
            staging: AssignmentStaging {
                draft: AssignmentDraft::default(),
                staged: Vec::new(),
                committed: true,
            },
        }
    }

    /// Throw away the draft and every staged assignment.
    pub fn cancel(&self) -> Self {
        if !self.staged.is_empty() || !self.draft.is_empty() {
            debug!(discarded = self.staged.len(), "assignment staging cancelled");
        }
        AssignmentStaging::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ready_for_siti(db: &Database) -> AssignmentStaging {
        AssignmentStaging::new()
            .with_category("Spraying")
            .with_priority(Priority::High)
            .with_start_date(d(2024, 12, 1))
            .with_end_date(d(2024, 12, 2))
            .with_area("Block C")
            .with_worker(db.worker("w3").unwrap().clone())
    }

    #[test]
    fn test_state_progression() {
        let db = Database::default();
        let s = AssignmentStaging::new();
        assert_eq!(s.state(), StagingState::Empty);
        let s = s.with_category("Spraying");
        assert_eq!(s.state(), StagingState::Building);
        let s = ready_for_siti(&db);
        assert_eq!(s.state(), StagingState::Ready);
        let s = s.assign(&db).unwrap();
        assert_eq!(s.state(), StagingState::Empty);
        let commit = s.confirm_all();
        assert_eq!(commit.staging.state(), StagingState::Committed);
        assert_eq!(commit.staging.with_area("Block A").state(), StagingState::Building);
    }

    #[test]
    fn test_assign_then_confirm_creates_pending_task() {
        let mut db = Database::default();
        let staging = ready_for_siti(&db).assign(&db).unwrap();
        assert_eq!(staging.staged().len(), 1);
        assert_eq!(staging.staged()[0].worker.name, "Siti");

        let commit = staging.confirm_all();
        assert_eq!(commit.tasks.len(), 1);
        assert!(commit.staging.staged().is_empty());
        db.prepend(commit.tasks);

        let task = &db.tasks[0];
        assert_eq!(db.tasks.len(), 5);
        assert_eq!(task.title, "Spraying - Block C");
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.id, "5-w3");
    }

    #[test]
    fn test_assign_missing_area_changes_nothing() {
        let db = Database::default();
        let before = AssignmentStaging::new()
            .with_category("Spraying")
            .with_priority(Priority::High)
            .with_start_date(d(2024, 12, 1))
            .with_end_date(d(2024, 12, 2))
            .with_worker(db.worker("w3").unwrap().clone());
        let snapshot = before.clone();

        let err = before.assign(&db).unwrap_err();
        assert_eq!(err.form, FormKind::Assignment);
        assert_eq!(err.missing, vec![AREA_LABEL]);
        assert_eq!(before, snapshot);
        assert_eq!(before.state(), StagingState::Building);
        assert!(before.staged().is_empty());
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let db = Database::default();
        let s = ready_for_siti(&db).with_area("   ");
        let err = s.assign(&db).unwrap_err();
        assert_eq!(err.missing, vec![AREA_LABEL]);
    }

    #[test]
    fn test_unset_and_blank_fields_reported_together() {
        let db = Database::default();
        let s = ready_for_siti(&db).with_area("").clear_start_date();
        let err = s.assign(&db).unwrap_err();
        assert_eq!(err.form, FormKind::Assignment);
        assert_eq!(err.missing, vec![START_LABEL, AREA_LABEL]);
        assert_eq!(s.state(), StagingState::Building);
    }

    #[test]
    fn test_worker_selection_replaces() {
        let db = Database::default();
        let s = AssignmentStaging::new()
            .with_worker(db.worker("w1").unwrap().clone())
            .with_worker(db.worker("w2").unwrap().clone());
        assert_eq!(s.draft().worker.as_ref().unwrap().id, "w2");
    }

    #[test]
    fn test_multiple_staged_keep_order_and_unique_ids() {
        let db = Database::default();
        let first = ready_for_siti(&db).assign(&db).unwrap();
        let both = first
            .with_category("Spraying")
            .with_priority(Priority::Low)
            .with_start_date(d(2024, 12, 3))
            .with_end_date(d(2024, 12, 4))
            .with_area("Block D")
            .with_worker(db.worker("w3").unwrap().clone())
            .assign(&db)
            .unwrap();
        let ids: Vec<_> = both.staged().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["5-w3", "6-w3"]);

        let commit = both.confirm_all();
        let titles: Vec<_> = commit.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Spraying - Block C", "Spraying - Block D"]);
    }

    #[test]
    fn test_id_skips_existing_task_ids() {
        let mut db = Database::default();
        db.tasks[0].id = "5-w3".into();
        let s = ready_for_siti(&db).assign(&db).unwrap();
        assert_eq!(s.staged()[0].id, "6-w3");
    }

    #[test]
    fn test_cancel_discards_everything() {
        let db = Database::default();
        let s = ready_for_siti(&db).assign(&db).unwrap().with_area("Block A");
        let cancelled = s.cancel();
        assert!(cancelled.staged().is_empty());
        assert_eq!(cancelled.state(), StagingState::Empty);
    }

    #[test]
    fn test_confirm_with_nothing_staged() {
        let commit = AssignmentStaging::new().confirm_all();
        assert!(commit.tasks.is_empty());
    }
}
