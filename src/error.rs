//! Structured error types for library operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    ProjectNotFound,

    // Authorization / conflict errors
    NotAuthorized,
    DuplicateProjectName,

    // Collaborator errors
    CalendarError,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error carried back to callers.
#[derive(Debug, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn project_not_found(project_id: i64) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", project_id),
        )
    }

    /// Ownership failures do not reveal whether the project exists for
    /// another user.
    pub fn not_authorized(project_id: i64) -> Self {
        Self::new(
            ErrorCode::NotAuthorized,
            format!("Project {} not found or not owned by user", project_id),
        )
    }

    pub fn duplicate_project_name(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateProjectName,
            format!("A project named '{}' already exists for this user", name),
        )
        .with_field("name")
    }

    pub fn calendar(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::CalendarError, err.to_string())
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to AppError first
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(db_err) => AppError::database(db_err),
                Err(err) => AppError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::database(err)
    }
}

/// Result type for library operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
