//! Storage interface for users, projects and tasks.
//!
//! Handlers hold a `web::Data<dyn Repository>` and only ever receive fully materialised
//! collections from it; nothing downstream walks relationships lazily.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewProject, NewTask, NewUser, Project, Task, TaskStatus, User};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_URL: &str = "memory://";

/// Persistence for the application's entities.
///
/// Absent entities fail with `AppError::NotFound`, duplicate usernames or emails with
/// `AppError::Conflict`, anything else with `AppError::DatabaseError`.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    /// Prepare the store for use (create or migrate the schema). Idempotent.
    async fn initialize(&self) -> AppResult<()>;

    // === Users ===

    async fn count_users(&self) -> AppResult<i64>;

    /// Stores a new user. When `new.role` is `None` the first account becomes an admin.
    async fn create_user(&self, new: NewUser) -> AppResult<User>;

    async fn get_user(&self, id: i32) -> AppResult<User>;

    /// Looks a user up by username, or by email when `login` contains an `@`.
    async fn find_user_by_login(&self, login: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Persists email, full name, role and active flag of `user`.
    async fn update_user(&self, user: &User) -> AppResult<User>;

    // === Projects ===

    async fn create_project(&self, new: NewProject, now: DateTime<Utc>) -> AppResult<Project>;

    async fn get_project(&self, id: Uuid) -> AppResult<Project>;

    /// Projects owned by `user_id`, oldest first.
    async fn get_owned_projects(&self, user_id: i32) -> AppResult<Vec<Project>>;

    async fn update_project(&self, project: &Project) -> AppResult<Project>;

    /// Deletes the project together with all of its tasks.
    async fn delete_project(&self, id: Uuid) -> AppResult<()>;

    // === Tasks ===

    /// Fails with `NotFound` when the project or the assignee does not exist.
    async fn create_task(&self, new: NewTask, now: DateTime<Utc>) -> AppResult<Task>;

    async fn get_task(&self, id: Uuid) -> AppResult<Task>;

    async fn get_project_tasks(&self, project_id: Uuid) -> AppResult<Vec<Task>>;

    /// Tasks of projects owned by `user_id` plus tasks assigned to them, oldest first.
    async fn get_visible_tasks(&self, user_id: i32) -> AppResult<Vec<Task>>;

    async fn get_created_tasks(&self, user_id: i32) -> AppResult<Vec<Task>>;

    /// Persists the editable fields of `task`. Fails with `NotFound` for an unknown assignee.
    async fn update_task(&self, task: &Task) -> AppResult<Task>;

    /// Moves the task to `status`, maintaining `completed_at` as of `now`.
    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Task>;

    async fn delete_task(&self, id: Uuid) -> AppResult<()>;
}

/// Opens the repository named by `database_url`.
pub async fn connect(database_url: &str) -> AppResult<Arc<dyn Repository>> {
    if database_url == MEMORY_URL {
        log::warn!("using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryRepository::new()));
    }
    let repo = PgRepository::connect(database_url).await?;
    Ok(Arc::new(repo))
}
