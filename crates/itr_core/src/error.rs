use serde::{Deserialize, Serialize};
use std::fmt;

pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const DB_NOT_FOUND: &str = "DB_NOT_FOUND";

/// Field-level validation failure, surfaced to callers as `{ field, message }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Single structured error shape used across the store, handlers and client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            ..Self::new(VALIDATION_FAILED, "Validation failed")
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DB_NOT_FOUND, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is_validation(&self) -> bool {
        self.code.starts_with("VALIDATION_")
    }

    pub fn is_not_found(&self) -> bool {
        self.code == DB_NOT_FOUND
    }

    /// HTTP-equivalent status: 400 for validation, 404 for missing records, 500 otherwise.
    pub fn status(&self) -> u16 {
        if self.is_validation() {
            400
        } else if self.is_not_found() {
            404
        } else {
            500
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
