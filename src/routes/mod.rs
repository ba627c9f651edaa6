pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, Error, HttpRequest};

use crate::error::AppError;

/// Malformed JSON bodies become `{"error"}` responses: 422 when the body does not fit
/// the payload type, 400 for everything else (wrong content type, oversized body).
fn json_error(err: JsonPayloadError, req: &HttpRequest) -> Error {
    log::debug!("rejected body for {}: {}", req.path(), err);
    match err {
        JsonPayloadError::Deserialize(e) => AppError::ValidationError(e.to_string()).into(),
        other => AppError::BadRequest(other.to_string()).into(),
    }
}

fn query_error(err: QueryPayloadError, req: &HttpRequest) -> Error {
    log::debug!("rejected query for {}: {}", req.path(), err);
    AppError::ValidationError(err.to_string()).into()
}

/// Registers every route under `/api`. The caller wraps the scope in `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register),
        )
        .service(dashboard::dashboard)
        .service(dashboard::get_profile)
        .service(dashboard::update_profile)
        .service(
            web::scope("/projects")
                .service(projects::get_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project)
                .service(projects::get_project_tasks),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::update_task_status)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/export")
                .service(export::export_tasks_csv)
                .service(export::export_projects_csv)
                .service(export::export_tasks_pdf),
        )
        .service(
            web::scope("/admin")
                .service(admin::list_users)
                .service(admin::create_user)
                .service(admin::update_role)
                .service(admin::update_status),
        );
}
