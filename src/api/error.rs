//! HTTP error payloads and their mapping from crate errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::error::NotemateError;

/// Stable numeric codes carried in every error body.
pub mod error_codes {
    pub const NOTE_NOT_FOUND: i32 = 1001;
    pub const VALIDATION_FAILED: i32 = 1002;
    pub const STALE_STATE: i32 = 1003;
    pub const UNAUTHENTICATED: i32 = 1004;
    pub const TRANSIENT: i32 = 1010;
    pub const STORAGE_ERROR: i32 = 1011;
    pub const INTERNAL_ERROR: i32 = 1012;
}

/// Validation limits for note fields.
pub mod validation {
    pub const MAX_TITLE_LENGTH: usize = 500;
    pub const MAX_CONTENT_SIZE: usize = 102_400; // 100KB
    pub const MAX_BORDER_RADIUS: u32 = 64;
    pub const MAX_ELEVATION: u32 = 24;
    pub const MAX_BATCH_SIZE: usize = 10_000;
}

pub const VALID_STATUSES: &[&str] = &["active", "archived", "completed"];

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ApiError {
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Title is required")]
    TitleRequired,

    #[error("Title too long: {actual} characters (max {max})")]
    TitleTooLong { max: usize, actual: usize },

    #[error("Content is required")]
    ContentRequired,

    #[error("Content too large: {actual} bytes (max {max})")]
    ContentTooLarge { max: usize, actual: usize },

    #[error("Invalid value '{value}' for field '{field}'. Valid values: {}", valid.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    #[error("Invalid colour '{value}' for field '{field}'")]
    InvalidColor { field: String, value: String },

    #[error("Note set changed: {message}")]
    StaleState { message: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Temporarily unavailable: {message}")]
    Transient { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ApiError {
    pub fn error_code(&self) -> i32 {
        match self {
            ApiError::NoteNotFound { .. } => error_codes::NOTE_NOT_FOUND,
            ApiError::ValidationFailed { .. }
            | ApiError::TitleRequired
            | ApiError::TitleTooLong { .. }
            | ApiError::ContentRequired
            | ApiError::ContentTooLarge { .. }
            | ApiError::InvalidEnumValue { .. }
            | ApiError::InvalidColor { .. } => error_codes::VALIDATION_FAILED,
            ApiError::StaleState { .. } => error_codes::STALE_STATE,
            ApiError::Unauthenticated => error_codes::UNAUTHENTICATED,
            ApiError::Transient { .. } => error_codes::TRANSIENT,
            ApiError::StorageError { .. } => error_codes::STORAGE_ERROR,
            ApiError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NoteNotFound { .. } => "NotFound",
            ApiError::ValidationFailed { .. }
            | ApiError::TitleRequired
            | ApiError::TitleTooLong { .. }
            | ApiError::ContentRequired
            | ApiError::ContentTooLarge { .. }
            | ApiError::InvalidEnumValue { .. }
            | ApiError::InvalidColor { .. } => "InvalidInput",
            ApiError::StaleState { .. } => "StaleState",
            ApiError::Unauthenticated => "Unauthenticated",
            ApiError::Transient { .. } => "Transient",
            ApiError::StorageError { .. } => "StorageError",
            ApiError::InternalError { .. } => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error_code() {
            error_codes::NOTE_NOT_FOUND => StatusCode::NOT_FOUND,
            error_codes::VALIDATION_FAILED => StatusCode::BAD_REQUEST,
            error_codes::STALE_STATE => StatusCode::CONFLICT,
            error_codes::UNAUTHENTICATED => StatusCode::UNAUTHORIZED,
            error_codes::TRANSIENT => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        json!({
            "error": self.to_string(),
            "errorType": self.error_type(),
            "code": self.error_code(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<NotemateError> for ApiError {
    fn from(err: NotemateError) -> Self {
        match err {
            NotemateError::NoteNotFound(id) => ApiError::NoteNotFound { id },
            NotemateError::InvalidInput(message) => ApiError::ValidationFailed {
                field: "body".to_string(),
                message,
            },
            NotemateError::StaleState(message) => ApiError::StaleState { message },
            NotemateError::Unauthenticated => ApiError::Unauthenticated,
            NotemateError::Transient(message) => ApiError::Transient { message },
            NotemateError::Storage(message) => ApiError::StorageError { message },
            NotemateError::NotInitialized => ApiError::StorageError {
                message: "Not in a notemate project".to_string(),
            },
            NotemateError::AlreadyInitialized => ApiError::StorageError {
                message: "Already initialized".to_string(),
            },
            NotemateError::Io(e) => ApiError::StorageError {
                message: format!("IO error: {}", e),
            },
            NotemateError::Json(e) => ApiError::InternalError {
                message: format!("JSON error: {}", e),
            },
            NotemateError::Yaml(e) => ApiError::InternalError {
                message: format!("Config error: {}", e),
            },
        }
    }
}
