use actix_web::{get, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    dashboard::{build_dashboard, build_profile_stats, ProfileStats},
    error::AppError,
    models::{ProfileUpdate, User},
    storage::Repository,
};

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user: User,
    pub stats: ProfileStats,
}

/// Summary of the caller's projects and visible tasks as of now.
#[get("/dashboard")]
pub async fn dashboard(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let projects = repo.get_owned_projects(user.id).await?;
    let tasks = repo.get_visible_tasks(user.id).await?;

    let view = build_dashboard(&user, &projects, &tasks, Utc::now());
    Ok(HttpResponse::Ok().json(view))
}

async fn profile_view(repo: &dyn Repository, user: User) -> Result<ProfileView, AppError> {
    let projects = repo.get_owned_projects(user.id).await?;
    let tasks = repo.get_created_tasks(user.id).await?;
    Ok(ProfileView {
        stats: build_profile_stats(&projects, &tasks),
        user,
    })
}

#[get("/profile")]
pub async fn get_profile(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let view = profile_view(repo.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Updates the caller's email and/or full name. A taken email is 409.
#[put("/profile")]
pub async fn update_profile(
    repo: web::Data<dyn Repository>,
    CurrentUser(mut user): CurrentUser,
    update: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let update = update.into_inner();

    if let Some(email) = update.email {
        user.email = email.trim().to_string();
    }
    if let Some(full_name) = update.full_name {
        user.full_name = full_name.trim().to_string();
    }
    let user = repo.update_user(&user).await?;
    log::info!("user {} updated their profile", user.id);

    let view = profile_view(repo.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(view))
}
