use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{self, generate_token, AuthResponse, LoginRequest, RegisterRequest},
    config::AuthSettings,
    error::AppError,
    storage::Repository,
};

/// Register a new user
///
/// Creates the account and returns a session token. The first account in the system
/// becomes an administrator. Responds 409 when the username or email is taken and 422
/// when a field is malformed.
#[post("/register")]
pub async fn register(
    repo: web::Data<dyn Repository>,
    settings: web::Data<AuthSettings>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = auth::register_user(
        repo.get_ref(),
        settings.get_ref(),
        register_data.into_inner(),
        None,
    )
    .await?;
    let token = generate_token(&settings, user.id, false)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

/// Login user
///
/// `login` is a username or an email address. Wrong credentials are 401, a
/// deactivated account is 403.
#[post("/login")]
pub async fn login(
    repo: web::Data<dyn Repository>,
    settings: web::Data<AuthSettings>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = auth::authenticate(repo.get_ref(), &login_data.login, &login_data.password).await?;
    let token = generate_token(&settings, user.id, login_data.remember)?;
    log::info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}
