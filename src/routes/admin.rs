use actix_web::{get, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    access::require_admin,
    auth::{hash_password, CurrentUser},
    config::AuthSettings,
    error::AppError,
    models::{ActiveUpdate, NewUser, Role, RoleUpdate, UserInput},
    storage::Repository,
};

/// All accounts, by id. Admin only.
#[get("/users")]
pub async fn list_users(
    repo: web::Data<dyn Repository>,
    CurrentUser(admin): CurrentUser,
) -> Result<impl Responder, AppError> {
    require_admin(&admin)?;
    let users = repo.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Creates an account with an explicit role. Admin only.
#[post("/users")]
pub async fn create_user(
    repo: web::Data<dyn Repository>,
    settings: web::Data<AuthSettings>,
    CurrentUser(admin): CurrentUser,
    user_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    require_admin(&admin)?;
    user_data.validate()?;

    let input = user_data.into_inner();
    let password_hash = hash_password(&input.password, settings.bcrypt_cost)?;
    let user = repo
        .create_user(NewUser {
            username: input.username,
            email: input.email.trim().to_string(),
            full_name: input.full_name.trim().to_string(),
            password_hash,
            role: Some(input.role),
        })
        .await?;
    log::info!("admin {} created user {} as {}", admin.id, user.id, user.role);

    Ok(HttpResponse::Created().json(user))
}

/// Changes a user's role. An admin cannot demote themselves.
#[put("/users/{id}/role")]
pub async fn update_role(
    repo: web::Data<dyn Repository>,
    CurrentUser(admin): CurrentUser,
    user_id: web::Path<i32>,
    role_data: web::Json<RoleUpdate>,
) -> Result<impl Responder, AppError> {
    require_admin(&admin)?;
    let user_id = user_id.into_inner();
    if user_id == admin.id && role_data.role != Role::Admin {
        return Err(AppError::BadRequest("You cannot remove your own admin role".into()));
    }

    let mut user = repo.get_user(user_id).await?;
    user.role = role_data.role;
    let user = repo.update_user(&user).await?;
    log::info!("admin {} set role of user {} to {}", admin.id, user.id, user.role);

    Ok(HttpResponse::Ok().json(user))
}

/// Activates or deactivates an account. An admin cannot deactivate themselves.
#[put("/users/{id}/status")]
pub async fn update_status(
    repo: web::Data<dyn Repository>,
    CurrentUser(admin): CurrentUser,
    user_id: web::Path<i32>,
    status_data: web::Json<ActiveUpdate>,
) -> Result<impl Responder, AppError> {
    require_admin(&admin)?;
    let user_id = user_id.into_inner();
    if user_id == admin.id && !status_data.is_active {
        return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
    }

    let mut user = repo.get_user(user_id).await?;
    user.is_active = status_data.is_active;
    let user = repo.update_user(&user).await?;
    log::info!(
        "admin {} {} user {}",
        admin.id,
        if user.is_active { "activated" } else { "deactivated" },
        user.id
    );

    Ok(HttpResponse::Ok().json(user))
}
