use actix_web::{get, http::header, web, HttpResponse, Responder};

use crate::{
    auth::CurrentUser,
    error::AppError,
    export::{
        projects_to_csv, tasks_to_csv, tasks_to_pdf, UserNames, CSV_CONTENT_TYPE,
        PDF_CONTENT_TYPE,
    },
    storage::Repository,
};

async fn user_names(repo: &dyn Repository) -> Result<UserNames, AppError> {
    let users = repo.list_users().await?;
    Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

/// The caller's visible tasks as CSV.
#[get("/tasks.csv")]
pub async fn export_tasks_csv(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = repo.get_visible_tasks(user.id).await?;
    let names = user_names(repo.get_ref()).await?;
    let body = tasks_to_csv(&tasks, &names)?;
    Ok(attachment(CSV_CONTENT_TYPE, "tasks.csv", body))
}

/// The caller's projects as CSV.
#[get("/projects.csv")]
pub async fn export_projects_csv(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let projects = repo.get_owned_projects(user.id).await?;
    let names = user_names(repo.get_ref()).await?;
    let body = projects_to_csv(&projects, &names)?;
    Ok(attachment(CSV_CONTENT_TYPE, "projects.csv", body))
}

/// The caller's visible tasks as a PDF table.
#[get("/tasks.pdf")]
pub async fn export_tasks_pdf(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = repo.get_visible_tasks(user.id).await?;
    let names = user_names(repo.get_ref()).await?;
    Ok(attachment(PDF_CONTENT_TYPE, "tasks.pdf", tasks_to_pdf(&tasks, &names)))
}
