use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::task::Priority;
use crate::validation::FieldError;

/// Lifecycle of a project.
/// Corresponds to the `project_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            _ => Err(FieldError::new(
                "status",
                "must be one of active, completed, archived",
            )),
        }
    }
}

/// Payload for creating or updating a project.
/// Absent `priority` and `status` fall back to the defaults on creation and keep the
/// current value on update.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(custom = "crate::validation::check_priority")]
    pub priority: Option<String>,

    #[validate(custom = "crate::validation::check_project_status")]
    pub status: Option<String>,
}

/// A validated project ready to be stored.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: ProjectStatus,
    pub owner_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: ProjectStatus,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectInput {
    pub fn into_new_project(self, owner_id: i32) -> Result<NewProject, FieldError> {
        let priority = match self.priority.as_deref() {
            Some(p) => p.parse()?,
            None => Priority::default(),
        };
        let status = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => ProjectStatus::default(),
        };
        Ok(NewProject {
            name: self.name.trim().to_string(),
            description: self.description,
            priority,
            status,
            owner_id,
        })
    }
}

impl Project {
    pub fn new(input: NewProject, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            priority: input.priority,
            status: input.status,
            owner_id: input.owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, input: ProjectInput, now: DateTime<Utc>) -> Result<(), FieldError> {
        let priority: Option<Priority> = input.priority.as_deref().map(str::parse).transpose()?;
        let status: Option<ProjectStatus> = input.status.as_deref().map(str::parse).transpose()?;

        self.name = input.name.trim().to_string();
        self.description = input.description;
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(status) = status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input(priority: Option<&str>, status: Option<&str>) -> ProjectInput {
        ProjectInput {
            name: "Website".to_string(),
            description: Some("Corporate site".to_string()),
            priority: priority.map(String::from),
            status: status.map(String::from),
        }
    }

    #[test]
    fn test_project_defaults() {
        let now = Utc::now();
        let project = Project::new(input(None, None).into_new_project(3).unwrap(), now);
        assert_eq!(project.owner_id, 3);
        assert_eq!(project.priority, Priority::Medium);
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_project_validation() {
        assert!(input(Some("high"), Some("archived")).validate().is_ok());
        assert!(input(Some("critical"), None).validate().is_err());
        assert!(input(None, Some("pending")).validate().is_err());

        let mut unnamed = input(None, None);
        unnamed.name = String::new();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_update_touches_updated_at() {
        let created = Utc::now();
        let mut project = Project::new(input(None, None).into_new_project(1).unwrap(), created);
        let later = created + Duration::minutes(5);
        project
            .apply_update(input(Some("low"), Some("completed")), later)
            .unwrap();
        assert_eq!(project.priority, Priority::Low);
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.updated_at, later);
        assert_eq!(project.created_at, created);
    }
}
