use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

/// Account role. Compared explicitly by access control.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::User => "user",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// bcrypt hash. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user ready to be stored. `role: None` lets storage decide: the very first
/// account becomes an admin, every later one a regular user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Option<Role>,
}

/// Payload for an admin creating an account on someone's behalf.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(custom = "crate::validation::check_username")]
    pub username: String,
    #[validate(custom = "crate::validation::check_email")]
    pub email: String,
    #[validate(custom = "crate::validation::check_password")]
    pub password: String, // Input only, stored as a hash
    #[validate(length(max = 100))]
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

/// Payload for editing one's own profile.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(custom = "crate::validation::check_email")]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveUpdate {
    pub is_active: bool,
}
