//! Boundary validation for user-supplied strings.
//!
//! Every validator is a pure, total function returning `Ok(())` or a [`FieldError`]
//! naming the offending field and a human readable reason. The request payloads in
//! [`crate::models`] reach these through `validator` derive rules, so the same policy
//! applies whether a value arrives through the HTTP API or the operational CLI.
//!
//! Password policy: at least 8 characters, at least one ASCII letter and one ASCII digit.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use validator::ValidationError;

use crate::models::{Priority, ProjectStatus, TaskStatus};

pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static::lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]{3,20}$").unwrap();
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

/// A rejected field together with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub fn validate_username(s: &str) -> Result<(), FieldError> {
    if USERNAME_REGEX.is_match(s) {
        Ok(())
    } else {
        Err(FieldError::new(
            "username",
            "must be 3 to 20 characters of letters, digits or underscores",
        ))
    }
}

pub fn validate_email(s: &str) -> Result<(), FieldError> {
    if EMAIL_REGEX.is_match(s) {
        Ok(())
    } else {
        Err(FieldError::new("email", "is not a valid email address"))
    }
}

pub fn validate_password(s: &str) -> Result<(), FieldError> {
    if s.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldError::new(
            "password",
            format!("must be at least {} characters long", MIN_PASSWORD_LENGTH),
        ));
    }
    if !s.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(FieldError::new("password", "must contain at least one letter"));
    }
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return Err(FieldError::new("password", "must contain at least one digit"));
    }
    Ok(())
}

/// Parses an ISO-8601 date or date-time.
///
/// Accepted shapes, in order: RFC 3339 (`2024-05-01T10:00:00Z`, with offset),
/// a naive date-time (`2024-05-01T10:00` or `2024-05-01T10:00:00`, taken as UTC)
/// and a bare date (`2024-05-01`, midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, FieldError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(FieldError::new("date", "is not a valid ISO-8601 date"))
}

pub fn validate_date(s: &str) -> Result<(), FieldError> {
    parse_date(s).map(|_| ())
}

pub fn validate_priority(s: &str) -> Result<(), FieldError> {
    s.parse::<Priority>().map(|_| ())
}

pub fn validate_status(s: &str) -> Result<(), FieldError> {
    s.parse::<TaskStatus>().map(|_| ())
}

pub fn validate_project_status(s: &str) -> Result<(), FieldError> {
    s.parse::<ProjectStatus>().map(|_| ())
}

// Adapters for `#[validate(custom = "...")]` on request payloads.

fn to_validation_error(err: FieldError) -> ValidationError {
    let mut error = ValidationError::new(err.field);
    error.message = Some(err.message.into());
    error
}

pub(crate) fn check_username(s: &str) -> Result<(), ValidationError> {
    validate_username(s).map_err(to_validation_error)
}

pub(crate) fn check_email(s: &str) -> Result<(), ValidationError> {
    validate_email(s).map_err(to_validation_error)
}

pub(crate) fn check_password(s: &str) -> Result<(), ValidationError> {
    validate_password(s).map_err(to_validation_error)
}

pub(crate) fn check_date(s: &str) -> Result<(), ValidationError> {
    validate_date(s).map_err(to_validation_error)
}

pub(crate) fn check_priority(s: &str) -> Result<(), ValidationError> {
    validate_priority(s).map_err(to_validation_error)
}

pub(crate) fn check_status(s: &str) -> Result<(), ValidationError> {
    validate_status(s).map_err(to_validation_error)
}

pub(crate) fn check_project_status(s: &str) -> Result<(), ValidationError> {
    validate_project_status(s).map_err(to_validation_error)
}
