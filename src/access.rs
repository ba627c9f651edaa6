//! Authorization decisions.
//!
//! Every function here takes the authenticated user explicitly and answers from the
//! entities it is handed; nothing is looked up and nothing is mutated. Handlers call
//! these before they invoke a mutation.

use crate::error::AppError;
use crate::models::{Project, Task, User};

pub fn can_modify_project(user: &User, project: &Project) -> bool {
    user.is_admin() || project.owner_id == user.id
}

/// `project` must be the task's parent project.
pub fn can_modify_task(user: &User, task: &Task, project: &Project) -> bool {
    user.is_admin() || project.owner_id == user.id || task.created_by == user.id
}

pub fn can_view_task(user: &User, task: &Task, project: &Project) -> bool {
    can_modify_task(user, task, project) || task.assigned_to == Some(user.id)
}

pub fn require_active(user: &User) -> Result<(), AppError> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::Forbidden("Account is deactivated".into()))
    }
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator role required".into()))
    }
}

pub fn authorize_project(user: &User, project: &Project) -> Result<(), AppError> {
    if can_modify_project(user, project) {
        Ok(())
    } else {
        log::warn!(
            "user {} denied modification of project {}",
            user.id,
            project.id
        );
        Err(AppError::Forbidden(
            "You do not have permission to modify this project".into(),
        ))
    }
}

pub fn authorize_task(user: &User, task: &Task, project: &Project) -> Result<(), AppError> {
    if can_modify_task(user, task, project) {
        Ok(())
    } else {
        log::warn!("user {} denied modification of task {}", user.id, task.id);
        Err(AppError::Forbidden(
            "You do not have permission to modify this task".into(),
        ))
    }
}

pub fn authorize_task_view(user: &User, task: &Task, project: &Project) -> Result<(), AppError> {
    if can_view_task(user, task, project) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to view this task".into(),
        ))
    }
}
