pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, User};
use crate::storage::Repository;

pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username, or email address when it contains an `@`.
    #[validate(length(min = 1))]
    pub login: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Issue a long-lived token.
    #[serde(default)]
    pub remember: bool,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 3 to 20 letters, digits or underscores.
    #[validate(custom = "crate::validation::check_username")]
    pub username: String,
    #[validate(custom = "crate::validation::check_email")]
    pub email: String,
    /// At least 8 characters with a letter and a digit.
    #[validate(custom = "crate::validation::check_password")]
    pub password: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub full_name: String,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
}

/// Validates `request`, hashes the password and stores the account.
///
/// With `role: None` the first account in the system becomes an admin. Duplicate
/// usernames or emails fail with `AppError::Conflict`.
pub async fn register_user(
    repo: &dyn Repository,
    settings: &AuthSettings,
    request: RegisterRequest,
    role: Option<Role>,
) -> AppResult<User> {
    request.validate()?;
    let password_hash = hash_password(&request.password, settings.bcrypt_cost)?;
    let user = repo
        .create_user(NewUser {
            username: request.username,
            email: request.email.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            password_hash,
            role,
        })
        .await?;
    log::info!("registered user {} ({}) as {}", user.username, user.id, user.role);
    Ok(user)
}

/// Checks credentials. Unknown login and wrong password are indistinguishable
/// (`Unauthorized`); a correct password on a deactivated account is `Forbidden`.
pub async fn authenticate(repo: &dyn Repository, login: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user = match repo.find_user_by_login(login.trim()).await? {
        Some(user) => user,
        None => {
            log::warn!("login failed for unknown account {:?}", login);
            return Err(invalid());
        }
    };
    if !verify_password(password, &user.password_hash)? {
        log::warn!("login failed for user {}: wrong password", user.id);
        return Err(invalid());
    }
    if !user.is_active {
        log::warn!("login refused for deactivated user {}", user.id);
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }
    Ok(user)
}
