//! Operational commands that write directly to storage: creating an administrator
//! account and loading a small demo data set.

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::auth::{hash_password, RegisterRequest};
use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewProject, NewTask, NewUser, Priority, ProjectStatus, Role, TaskStatus, User,
};
use crate::storage::Repository;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "Demo123!";

/// What `seed_demo_data` stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub user: User,
    pub projects: usize,
    pub tasks: usize,
}

/// Creates an administrator account.
///
/// Fails with `Conflict("user already exists")` when the username or the email is taken.
pub async fn create_admin(
    repo: &dyn Repository,
    settings: &AuthSettings,
    request: RegisterRequest,
) -> AppResult<User> {
    request.validate()?;
    let email = request.email.trim();
    let taken = repo.list_users().await?.iter().any(|user| {
        user.username.eq_ignore_ascii_case(&request.username)
            || user.email.eq_ignore_ascii_case(email)
    });
    if taken {
        return Err(AppError::Conflict("user already exists".into()));
    }

    let password_hash = hash_password(&request.password, settings.bcrypt_cost)?;
    let user = repo
        .create_user(NewUser {
            username: request.username,
            email: request.email.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            password_hash,
            role: Some(Role::Admin),
        })
        .await?;
    log::info!("created administrator {} ({})", user.username, user.id);
    Ok(user)
}

struct DemoTask {
    title: &'static str,
    description: &'static str,
    priority: Priority,
    status: TaskStatus,
    project: usize,
    due_in_days: i64,
}

const DEMO_TASKS: [DemoTask; 4] = [
    DemoTask {
        title: "Design the user interface",
        description: "Create mockups and wireframes",
        priority: Priority::High,
        status: TaskStatus::Completed,
        project: 0,
        due_in_days: -5,
    },
    DemoTask {
        title: "Implement authentication",
        description: "Login and registration flow",
        priority: Priority::High,
        status: TaskStatus::InProgress,
        project: 0,
        due_in_days: 3,
    },
    DemoTask {
        title: "Set up the database",
        description: "PostgreSQL and migrations",
        priority: Priority::Medium,
        status: TaskStatus::Pending,
        project: 0,
        due_in_days: 7,
    },
    DemoTask {
        title: "Design the main screens",
        description: "Home, profile, settings",
        priority: Priority::High,
        status: TaskStatus::Pending,
        project: 1,
        due_in_days: 10,
    },
];

/// Creates the `demo` user with two projects and four tasks, due dates relative to `now`.
///
/// Fails with `Conflict("data already exists")` when the demo user is already present.
pub async fn seed_demo_data(
    repo: &dyn Repository,
    settings: &AuthSettings,
    now: DateTime<Utc>,
) -> AppResult<SeedSummary> {
    if repo.find_user_by_login(DEMO_USERNAME).await?.is_some() {
        return Err(AppError::Conflict("data already exists".into()));
    }

    let user = repo
        .create_user(NewUser {
            username: DEMO_USERNAME.to_string(),
            email: "demo@example.com".to_string(),
            full_name: "Demo User".to_string(),
            password_hash: hash_password(DEMO_PASSWORD, settings.bcrypt_cost)?,
            role: Some(Role::User),
        })
        .await?;

    let demo_projects = [
        ("Website", "Corporate website development", Priority::High),
        ("Mobile App", "Mobile application for iOS and Android", Priority::Medium),
    ];
    let mut projects = Vec::with_capacity(demo_projects.len());
    for (name, description, priority) in demo_projects {
        let project = repo
            .create_project(
                NewProject {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    priority,
                    status: ProjectStatus::Active,
                    owner_id: user.id,
                },
                now,
            )
            .await?;
        projects.push(project);
    }

    for demo in &DEMO_TASKS {
        repo.create_task(
            NewTask {
                title: demo.title.to_string(),
                description: Some(demo.description.to_string()),
                priority: demo.priority,
                status: demo.status,
                project_id: projects[demo.project].id,
                created_by: user.id,
                assigned_to: Some(user.id),
                due_date: Some(now + Duration::days(demo.due_in_days)),
            },
            now,
        )
        .await?;
    }

    log::info!("seeded demo data for user {}", user.id);
    Ok(SeedSummary {
        user,
        projects: projects.len(),
        tasks: DEMO_TASKS.len(),
    })
}
