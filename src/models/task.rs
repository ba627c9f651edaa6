use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{parse_date, FieldError};

/// Importance of a task or project.
/// Corresponds to the `priority_level` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(FieldError::new("priority", "must be one of low, medium, high")),
        }
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is finished.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(FieldError::new(
                "status",
                "must be one of pending, in_progress, completed",
            )),
        }
    }
}

/// Payload for creating a task.
///
/// Enumerations and dates arrive as strings so that out-of-range values are reported
/// as field-level validation errors instead of opaque deserialization failures.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(custom = "crate::validation::check_priority")]
    pub priority: Option<String>,

    #[validate(custom = "crate::validation::check_status")]
    pub status: Option<String>,

    pub project_id: Uuid,

    pub assigned_to: Option<i32>,

    #[validate(custom = "crate::validation::check_date")]
    pub due_date: Option<String>,
}

/// Payload for replacing the editable fields of a task.
///
/// `description`, `assigned_to` and `due_date` are replaced as given (absent clears them);
/// absent `priority` or `status` keep their current value.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(custom = "crate::validation::check_priority")]
    pub priority: Option<String>,

    #[validate(custom = "crate::validation::check_status")]
    pub status: Option<String>,

    pub assigned_to: Option<i32>,

    #[validate(custom = "crate::validation::check_date")]
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskStatusInput {
    #[validate(custom = "crate::validation::check_status")]
    pub status: String,
}

/// A validated task ready to be stored.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub project_id: Uuid,
    pub created_by: i32,
    pub assigned_to: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A task as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub project_id: Uuid,
    /// User who created the task.
    pub created_by: i32,
    /// User responsible for the task, if any.
    pub assigned_to: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Set exactly while `status` is `completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
    /// Case-insensitive match against title and description.
    pub search: Option<String>,
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, FieldError> {
    value.map(parse_date).transpose()
}

impl TaskInput {
    pub fn into_new_task(self, created_by: i32) -> Result<NewTask, FieldError> {
        let priority = match self.priority.as_deref() {
            Some(p) => p.parse()?,
            None => Priority::default(),
        };
        let status = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => TaskStatus::default(),
        };
        Ok(NewTask {
            title: self.title.trim().to_string(),
            description: self.description,
            priority,
            status,
            project_id: self.project_id,
            created_by,
            assigned_to: self.assigned_to,
            due_date: parse_optional_date(self.due_date.as_deref())?,
        })
    }
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.map_or(false, |s| s != task.status) {
            return false;
        }
        if self.priority.map_or(false, |p| p != task.priority) {
            return false;
        }
        if self.project_id.map_or(false, |id| id != task.project_id) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                task.title.to_lowercase().contains(&term)
                    || task
                        .description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}

impl Task {
    /// Builds a fresh task with a new id, stamping `created_at` (and `completed_at`
    /// when the task starts out completed) with `now`.
    pub fn new(input: NewTask, now: DateTime<Utc>) -> Self {
        let completed_at = (input.status == TaskStatus::Completed).then_some(now);
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority,
            status: input.status,
            project_id: input.project_id,
            created_by: input.created_by,
            assigned_to: input.assigned_to,
            due_date: input.due_date,
            created_at: now,
            completed_at,
        }
    }

    /// Moves the task to `status`, keeping `completed_at` in step: entering `completed`
    /// stamps `now`, staying there keeps the original stamp, leaving clears it.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TaskStatus::Completed, TaskStatus::Completed) => {}
            (_, TaskStatus::Completed) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// A task is overdue when it is not completed and its due date lies strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.due_date.map_or(false, |due| due < now)
    }

    pub fn apply_update(&mut self, update: TaskUpdate, now: DateTime<Utc>) -> Result<(), FieldError> {
        let priority: Option<Priority> = update.priority.as_deref().map(str::parse).transpose()?;
        let status: Option<TaskStatus> = update.status.as_deref().map(str::parse).transpose()?;
        let due_date = parse_optional_date(update.due_date.as_deref())?;

        self.title = update.title.trim().to_string();
        self.description = update.description;
        self.assigned_to = update.assigned_to;
        self.due_date = due_date;
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(status) = status {
            self.set_status(status, now);
        }
        Ok(())
    }
}
