//! Task domain model
//!
//! Tasks belong to exactly one user and carry a priority, an optional due
//! date, and a pending/completed status.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{TaskId, UserId};

/// How urgent a task is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Returns the display label (also the serialized form)
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Parses a label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Completed];

    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns the display label (also the serialized form)
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Parses a label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A unit of work owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title, never empty
    pub title: String,

    /// Free-form description, may be empty
    pub description: String,

    pub priority: Priority,

    /// Calendar date the task is due, if any
    pub due_date: Option<NaiveDate>,

    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last changed
    pub updated_at: DateTime<Utc>,

    /// Owning user
    pub user_id: UserId,
}

impl Task {
    /// Creates a new pending task for `user_id`
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: description.into(),
            priority,
            due_date,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            user_id,
        }
    }

    /// Returns true if the task is past due as of `today`.
    ///
    /// Completed tasks and tasks without a due date are never overdue.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => !self.status.is_complete() && due < today,
            None => false,
        }
    }

    /// Returns true if the task is past due as of the local calendar date
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    /// Case-insensitive substring match on title or description.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Applies every supplied field of `patch` and bumps `updated_at`
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.touch();
    }

    fn touch(&mut self) {
        // Never move behind created_at, even if the wall clock steps back
        self.updated_at = Utc::now().max(self.created_at);
    }
}

/// A sparse set of task changes.
///
/// `None` means "leave unchanged". For the due date, `Some(None)` clears it
/// while `None` leaves it alone; an empty description is likewise a real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if no field is supplied
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

/// Task counts for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskSummary {
    /// Tallies `tasks`, judging overdue against `today`
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) -> Self {
        tasks.into_iter().fold(Self::default(), |mut acc, task| {
            acc.total += 1;
            match task.status {
                TaskStatus::Pending => acc.pending += 1,
                TaskStatus::Completed => acc.completed += 1,
            }
            if task.is_overdue_on(today) {
                acc.overdue += 1;
            }
            acc
        })
    }
}
