pub mod project;
pub mod task;
pub mod user;

pub use project::{NewProject, Project, ProjectInput, ProjectStatus};
pub use task::{NewTask, Priority, Task, TaskInput, TaskQuery, TaskStatus, TaskStatusInput, TaskUpdate};
pub use user::{ActiveUpdate, NewUser, ProfileUpdate, Role, RoleUpdate, User, UserInput};
