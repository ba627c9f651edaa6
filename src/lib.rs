#![doc = "The `projectforge` library crate."]
#![doc = ""]
#![doc = "Domain models, validation, access control, the dashboard aggregation, exports,"]
#![doc = "storage backends, authentication and the HTTP routes of the ProjectForge service."]
#![doc = "The binary (`main.rs`) wires these into an actix-web server and a small CLI."]

pub mod access;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod models;
pub mod routes;
pub mod seed;
pub mod storage;
pub mod validation;

pub use crate::error::{AppError, AppResult};
