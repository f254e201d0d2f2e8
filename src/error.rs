//! Error types for tally
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation failure, bad args, unknown task)
//! - 3: Forbidden (task belongs to another owner)
//! - 4: Operation failed (store IO, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tally CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const FORBIDDEN: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// A single field-level validation failure, reported at task creation.
#[derive(Debug, Clone, serde::Serialize)]
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

/// Main error type for tally operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("No owner set (use --owner, TALLY_OWNER, or `tally owner set`)")]
    OwnerNotSet,

    // Forbidden (exit code 3)
    #[error("Task {id} belongs to owner {holder}")]
    Forbidden { id: String, holder: String },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TaskNotFound(_)
            | Error::OwnerNotSet => exit_codes::USER_ERROR,

            Error::Forbidden { .. } => exit_codes::FORBIDDEN,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Machine-readable error kind, so callers can render
    /// "not found" vs "forbidden" vs "validation" distinctly.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::TaskNotFound(_) => "not_found",
            Error::Forbidden { .. } => "forbidden",
            Error::InvalidArgument(_) | Error::InvalidConfig(_) | Error::OwnerNotSet => {
                "user_error"
            }
            _ => "store_error",
        }
    }

    /// Structured detail payload for JSON error output.
    ///
    /// Store-level errors return `None`; their internals go to the tracing
    /// log, not to callers.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(errors) => serde_json::to_value(errors).ok(),
            Error::Forbidden { id, holder } => Some(serde_json::json!({
                "id": id,
                "holder": holder,
            })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}

/// Result type alias for tally operations
pub type Result<T> = std::result::Result<T, Error>;
