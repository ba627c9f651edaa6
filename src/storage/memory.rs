//! In-memory repository.
//!
//! Backs `DATABASE_URL=memory://` and the test suite. All state sits behind one mutex,
//! so every operation observes and leaves a consistent snapshot. Entities are kept in
//! insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{NewProject, NewTask, NewUser, Project, Role, Task, TaskStatus, User};

#[derive(Default)]
struct State {
    next_user_id: i32,
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl State {
    fn user(&self, id: i32) -> AppResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    fn ensure_unique(&self, username: &str, email: &str, except: Option<i32>) -> AppResult<()> {
        let others = self.users.iter().filter(|u| Some(u.id) != except);
        for user in others {
            if user.username.eq_ignore_ascii_case(username) {
                return Err(AppError::Conflict("Username already exists".into()));
            }
            if user.email.eq_ignore_ascii_case(email) {
                return Err(AppError::Conflict("Email already exists".into()));
            }
        }
        Ok(())
    }

    fn ensure_assignee(&self, assigned_to: Option<i32>) -> AppResult<()> {
        match assigned_to {
            Some(id) => self.user(id).map(|_| ()),
            None => Ok(()),
        }
    }

    fn task_mut(&mut self, id: Uuid) -> AppResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn storage_type(&self) -> &'static str {
        "memory"
    }

    async fn initialize(&self) -> AppResult<()> {
        Ok(())
    }

    async fn count_users(&self) -> AppResult<i64> {
        Ok(self.lock()?.users.len() as i64)
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut state = self.lock()?;
        state.ensure_unique(&new.username, &new.email, None)?;
        let role = new.role.unwrap_or(if state.users.is_empty() {
            Role::Admin
        } else {
            Role::User
        });
        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            password_hash: new.password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.lock()?.user(id).cloned()
    }

    async fn find_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let state = self.lock()?;
        let by_email = login.contains('@');
        Ok(state
            .users
            .iter()
            .find(|u| {
                if by_email {
                    u.email.eq_ignore_ascii_case(login)
                } else {
                    u.username == login
                }
            })
            .cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.lock()?.users.clone())
    }

    async fn update_user(&self, user: &User) -> AppResult<User> {
        let mut state = self.lock()?;
        state.user(user.id)?;
        state.ensure_unique(&user.username, &user.email, Some(user.id))?;
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
        stored.email = user.email.clone();
        stored.full_name = user.full_name.clone();
        stored.role = user.role;
        stored.is_active = user.is_active;
        Ok(stored.clone())
    }

    async fn create_project(&self, new: NewProject, now: DateTime<Utc>) -> AppResult<Project> {
        let mut state = self.lock()?;
        state.user(new.owner_id)?;
        let project = Project::new(new, now);
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> AppResult<Project> {
        self.lock()?
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn get_owned_projects(&self, user_id: i32) -> AppResult<Vec<Project>> {
        Ok(self
            .lock()?
            .projects
            .iter()
            .filter(|p| p.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_project(&self, project: &Project) -> AppResult<Project> {
        let mut state = self.lock()?;
        let stored = state
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
        *stored = Project {
            owner_id: stored.owner_id,
            created_at: stored.created_at,
            ..project.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_project(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.lock()?;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(AppError::NotFound("Project not found".into()));
        }
        state.tasks.retain(|t| t.project_id != id);
        Ok(())
    }

    async fn create_task(&self, new: NewTask, now: DateTime<Utc>) -> AppResult<Task> {
        let mut state = self.lock()?;
        if !state.projects.iter().any(|p| p.id == new.project_id) {
            return Err(AppError::NotFound("Project not found".into()));
        }
        state.ensure_assignee(new.assigned_to)?;
        let task = Task::new(new, now);
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> AppResult<Task> {
        self.lock()?
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn get_project_tasks(&self, project_id: Uuid) -> AppResult<Vec<Task>> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_visible_tasks(&self, user_id: i32) -> AppResult<Vec<Task>> {
        let state = self.lock()?;
        let owned: Vec<Uuid> = state
            .projects
            .iter()
            .filter(|p| p.owner_id == user_id)
            .map(|p| p.id)
            .collect();
        Ok(state
            .tasks
            .iter()
            .filter(|t| owned.contains(&t.project_id) || t.assigned_to == Some(user_id))
            .cloned()
            .collect())
    }

    async fn get_created_tasks(&self, user_id: i32) -> AppResult<Vec<Task>> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|t| t.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, task: &Task) -> AppResult<Task> {
        let mut state = self.lock()?;
        state.ensure_assignee(task.assigned_to)?;
        let stored = state.task_mut(task.id)?;
        *stored = Task {
            project_id: stored.project_id,
            created_by: stored.created_by,
            created_at: stored.created_at,
            ..task.clone()
        };
        Ok(stored.clone())
    }

    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Task> {
        let mut state = self.lock()?;
        let task = state.task_mut(task_id)?;
        task.set_status(status, now);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.lock()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(AppError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, ProjectStatus};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: String::new(),
            password_hash: "hash".to_string(),
            role: None,
        }
    }

    fn new_project(owner_id: i32) -> NewProject {
        NewProject {
            name: "Project".to_string(),
            description: None,
            priority: Priority::High,
            status: ProjectStatus::Active,
            owner_id,
        }
    }

    fn new_task(project_id: Uuid, created_by: i32, assigned_to: Option<i32>) -> NewTask {
        NewTask {
            title: "Task".to_string(),
            description: None,
            priority: Priority::Low,
            status: TaskStatus::Pending,
            project_id,
            created_by,
            assigned_to,
            due_date: None,
        }
    }

    #[actix_rt::test]
    async fn test_first_user_becomes_admin() {
        let repo = MemoryRepository::new();
        let first = repo.create_user(new_user("first")).await.unwrap();
        let second = repo.create_user(new_user("second")).await.unwrap();
        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::User);
        assert!(first.is_active);
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[actix_rt::test]
    async fn test_duplicate_username_and_email_conflict() {
        let repo = MemoryRepository::new();
        repo.create_user(new_user("alice")).await.unwrap();

        let same_name = repo.create_user(new_user("alice")).await;
        assert!(matches!(same_name, Err(AppError::Conflict(_))));

        let mut same_email = new_user("alice2");
        same_email.email = "ALICE@example.com".to_string();
        assert!(matches!(
            repo.create_user(same_email).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_find_user_by_login() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice")).await.unwrap();
        let by_name = repo.find_user_by_login("alice").await.unwrap();
        let by_email = repo.find_user_by_login("alice@example.com").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(alice.id));
        assert_eq!(by_email.map(|u| u.id), Some(alice.id));
        assert!(repo.find_user_by_login("bob").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_visible_tasks_union_and_cascade_delete() {
        let repo = MemoryRepository::new();
        let owner = repo.create_user(new_user("owner")).await.unwrap();
        let helper = repo.create_user(new_user("helper")).await.unwrap();
        let now = Utc::now();

        let mine = repo.create_project(new_project(owner.id), now).await.unwrap();
        let theirs = repo.create_project(new_project(helper.id), now).await.unwrap();

        let t1 = repo
            .create_task(new_task(mine.id, owner.id, None), now)
            .await
            .unwrap();
        let t2 = repo
            .create_task(new_task(theirs.id, helper.id, Some(owner.id)), now)
            .await
            .unwrap();
        repo.create_task(new_task(theirs.id, helper.id, None), now)
            .await
            .unwrap();

        let visible: Vec<Uuid> = repo
            .get_visible_tasks(owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(visible, vec![t1.id, t2.id]);

        repo.delete_project(theirs.id).await.unwrap();
        assert!(matches!(repo.get_task(t2.id).await, Err(AppError::NotFound(_))));
        assert!(repo.get_project_tasks(theirs.id).await.unwrap().is_empty());
        assert_eq!(repo.get_visible_tasks(owner.id).await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_task_requires_existing_project_and_assignee() {
        let repo = MemoryRepository::new();
        let owner = repo.create_user(new_user("owner")).await.unwrap();
        let project = repo
            .create_project(new_project(owner.id), Utc::now())
            .await
            .unwrap();

        let missing_project = repo
            .create_task(new_task(Uuid::new_v4(), owner.id, None), Utc::now())
            .await;
        assert!(matches!(missing_project, Err(AppError::NotFound(_))));

        let missing_assignee = repo
            .create_task(new_task(project.id, owner.id, Some(999)), Utc::now())
            .await;
        assert!(matches!(missing_assignee, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_update_task_status_maintains_completed_at() {
        let repo = MemoryRepository::new();
        let owner = repo.create_user(new_user("owner")).await.unwrap();
        let now = Utc::now();
        let project = repo.create_project(new_project(owner.id), now).await.unwrap();
        let task = repo
            .create_task(new_task(project.id, owner.id, None), now)
            .await
            .unwrap();

        let done = repo
            .update_task_status(task.id, TaskStatus::Completed, now)
            .await
            .unwrap();
        assert_eq!(done.completed_at, Some(now));

        let reopened = repo
            .update_task_status(task.id, TaskStatus::InProgress, now)
            .await
            .unwrap();
        assert!(reopened.completed_at.is_none());

        assert!(matches!(
            repo.update_task_status(Uuid::new_v4(), TaskStatus::Pending, now)
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
