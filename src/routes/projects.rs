use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::authorize_project,
    auth::CurrentUser,
    error::AppError,
    models::ProjectInput,
    storage::Repository,
};

/// Lists the projects owned by the caller, oldest first.
#[get("")]
pub async fn get_projects(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let projects = repo.get_owned_projects(user.id).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new `Project`.
/// - `422 Unprocessable Entity`: empty or overlong name, unknown priority or status.
#[post("")]
pub async fn create_project(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;

    let new_project = project_data.into_inner().into_new_project(user.id)?;
    let project = repo.create_project(new_project, Utc::now()).await?;
    log::info!("user {} created project {}", user.id, project.id);

    Ok(HttpResponse::Created().json(project))
}

#[get("/{id}")]
pub async fn get_project(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = repo.get_project(project_id.into_inner()).await?;
    authorize_project(&user, &project)?;
    Ok(HttpResponse::Ok().json(project))
}

/// Replaces name and description; absent priority or status keep their value.
#[put("/{id}")]
pub async fn update_project(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    project_id: web::Path<Uuid>,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;

    let mut project = repo.get_project(project_id.into_inner()).await?;
    authorize_project(&user, &project)?;

    project.apply_update(project_data.into_inner(), Utc::now())?;
    let project = repo.update_project(&project).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Deletes the project and every task in it.
#[delete("/{id}")]
pub async fn delete_project(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = repo.get_project(project_id.into_inner()).await?;
    authorize_project(&user, &project)?;

    repo.delete_project(project.id).await?;
    log::info!("user {} deleted project {}", user.id, project.id);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{id}/tasks")]
pub async fn get_project_tasks(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = repo.get_project(project_id.into_inner()).await?;
    authorize_project(&user, &project)?;

    let tasks = repo.get_project_tasks(project.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}
