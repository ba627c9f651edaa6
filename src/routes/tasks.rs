use crate::{
    access::{authorize_project, authorize_task, authorize_task_view},
    auth::CurrentUser,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskStatus, TaskStatusInput, TaskUpdate},
    storage::Repository,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

/// Retrieves the tasks visible to the caller.
///
/// Visible tasks are those of projects the caller owns plus those assigned to them,
/// oldest first.
///
/// ## Query Parameters:
/// - `status` (optional): `pending`, `in_progress` or `completed`.
/// - `priority` (optional): `low`, `medium` or `high`.
/// - `project_id` (optional): only tasks of this project.
/// - `search` (optional): case-insensitive match on title and description.
#[get("")]
pub async fn get_tasks(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks: Vec<_> = repo
        .get_visible_tasks(user.id)
        .await?
        .into_iter()
        .filter(|task| query_params.matches(task))
        .collect();

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in a project the caller may modify.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `403 Forbidden`: the caller neither owns the project nor is an admin.
/// - `404 Not Found`: the project or the assignee does not exist.
/// - `422 Unprocessable Entity`: a field is malformed.
#[post("")]
pub async fn create_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let project = repo.get_project(task_data.project_id).await?;
    authorize_project(&user, &project)?;

    let new_task = task_data.into_inner().into_new_task(user.id)?;
    let task = repo.create_task(new_task, Utc::now()).await?;
    log::info!("user {} created task {} in project {}", user.id, task.id, project.id);

    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = repo.get_task(task_id.into_inner()).await?;
    let project = repo.get_project(task.project_id).await?;
    authorize_task_view(&user, &task, &project)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Replaces the editable fields of a task.
///
/// A status change through this endpoint maintains `completed_at` the same way
/// `PUT /tasks/{id}/status` does.
#[put("/{id}")]
pub async fn update_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut task = repo.get_task(task_id.into_inner()).await?;
    let project = repo.get_project(task.project_id).await?;
    authorize_task(&user, &task, &project)?;

    task.apply_update(task_data.into_inner(), Utc::now())?;
    let task = repo.update_task(&task).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Moves a task to another status. Assignees may do this too.
#[put("/{id}/status")]
pub async fn update_task_status(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<Uuid>,
    status_data: web::Json<TaskStatusInput>,
) -> Result<impl Responder, AppError> {
    status_data.validate()?;
    let status: TaskStatus = status_data.status.parse()?;

    let task = repo.get_task(task_id.into_inner()).await?;
    let project = repo.get_project(task.project_id).await?;
    authorize_task_view(&user, &task, &project)?;

    let task = repo.update_task_status(task.id, status, Utc::now()).await?;
    log::info!("user {} moved task {} to {}", user.id, task.id, task.status);
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = repo.get_task(task_id.into_inner()).await?;
    let project = repo.get_project(task.project_id).await?;
    authorize_task(&user, &task, &project)?;

    repo.delete_task(task.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
