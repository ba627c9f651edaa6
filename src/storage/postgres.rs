//! PostgreSQL repository backed by an sqlx connection pool.
//!
//! The schema lives in `migrations/` and is embedded at compile time. Writes that span
//! several statements run inside a transaction, which rolls back when dropped on an
//! early `?` return.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{NewProject, NewTask, NewUser, Project, Task, TaskStatus, User};

const USER_COLUMNS: &str =
    "id, username, email, full_name, password_hash, role, is_active, created_at";
const PROJECT_COLUMNS: &str =
    "id, name, description, priority, status, owner_id, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, priority, status, project_id, created_by, \
     assigned_to, due_date, created_at, completed_at";

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        log::info!("connected to PostgreSQL");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Repository for PgRepository {
    fn storage_type(&self) -> &'static str {
        "postgres"
    }

    async fn initialize(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        log::info!("database schema is up to date");
        Ok(())
    }

    async fn count_users(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        // role NULL: the first account becomes admin
        let sql = format!(
            "INSERT INTO users (username, email, full_name, password_hash, role) \
             VALUES ($1, $2, $3, $4, COALESCE($5, \
                 CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'user'::user_role \
                 ELSE 'admin'::user_role END)) \
             RETURNING {}",
            USER_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        if new.role.is_none() {
            // self-conflicting lock: concurrent first registrations cannot both see an empty table
            sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
                .execute(&mut *tx)
                .await?;
        }
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.full_name)
            .bind(&new.password_hash)
            .bind(new.role)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn find_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let filter = if login.contains('@') {
            "LOWER(email) = LOWER($1)"
        } else {
            "username = $1"
        };
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, filter);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET email = $2, full_name = $3, role = $4, is_active = $5 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(user.role)
            .bind(user.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))
    }

    async fn create_project(&self, new: NewProject, now: DateTime<Utc>) -> AppResult<Project> {
        let project = Project::new(new, now);
        let sql = format!(
            "INSERT INTO projects ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {cols}",
            cols = PROJECT_COLUMNS
        );
        let stored = sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.priority)
            .bind(project.status)
            .bind(project.owner_id)
            .bind(project.created_at)
            .bind(project.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn get_project(&self, id: Uuid) -> AppResult<Project> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn get_owned_projects(&self, user_id: i32) -> AppResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE owner_id = $1 ORDER BY created_at, id",
            PROJECT_COLUMNS
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn update_project(&self, project: &Project) -> AppResult<Project> {
        let sql = format!(
            "UPDATE projects SET name = $2, description = $3, priority = $4, status = $5, \
             updated_at = $6 WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.priority)
            .bind(project.status)
            .bind(project.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn delete_project(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".into()));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn create_task(&self, new: NewTask, now: DateTime<Utc>) -> AppResult<Task> {
        let task = Task::new(new, now);
        let sql = format!(
            "INSERT INTO tasks ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {cols}",
            cols = TASK_COLUMNS
        );
        let stored = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.project_id)
            .bind(task.created_by)
            .bind(task.assigned_to)
            .bind(task.due_date)
            .bind(task.created_at)
            .bind(task.completed_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn get_task(&self, id: Uuid) -> AppResult<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn get_project_tasks(&self, project_id: Uuid) -> AppResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at, id",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn get_visible_tasks(&self, user_id: i32) -> AppResult<Vec<Task>> {
        let columns = TASK_COLUMNS
            .split(", ")
            .map(|c| format!("t.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE p.owner_id = $1 OR t.assigned_to = $1 \
             ORDER BY t.created_at, t.id",
            columns
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn get_created_tasks(&self, user_id: i32) -> AppResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE created_by = $1 ORDER BY created_at, id",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> AppResult<Task> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, priority = $4, status = $5, \
             assigned_to = $6, due_date = $7, completed_at = $8 WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.assigned_to)
            .bind(task.due_date)
            .bind(task.completed_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Task> {
        let mut tx = self.pool.begin().await?;
        let select = format!("SELECT {} FROM tasks WHERE id = $1 FOR UPDATE", TASK_COLUMNS);
        let mut task = sqlx::query_as::<_, Task>(&select)
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
        task.set_status(status, now);
        sqlx::query("UPDATE tasks SET status = $2, completed_at = $3 WHERE id = $1")
            .bind(task.id)
            .bind(task.status)
            .bind(task.completed_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}
