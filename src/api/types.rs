//! Request bodies, validation helpers, and response types for the HTTP API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{validation, ApiError, VALID_STATUSES};
use crate::entity::{NoteStatus, Theme};
use crate::storage::{NoteFilter, NoteUpdate};

// ============================================================================
// Request types
// ============================================================================

/// Body of `POST /api/notes`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub theme: Option<Theme>,
    pub status: Option<String>,
}

/// Body of `PATCH /api/notes/{id}`; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub theme: Option<Theme>,
    pub status: Option<String>,
}

/// Body of `PATCH /api/notes/{id}/order`
///
/// Kept as a raw JSON value so a non-integer rank is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNoteRequest {
    #[serde(default)]
    pub new_order: serde_json::Value,
}

/// Query string of `GET /api/notes`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// A status name, or `all`.
    pub status: Option<String>,
    pub q: Option<String>,
}

impl ListQuery {
    pub fn into_filter(self) -> Result<NoteFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(status) => Some(parse_status(status)?),
        };
        Ok(NoteFilter {
            status,
            query: self.q.filter(|q| !q.is_empty()),
        })
    }
}

/// Body of `PUT /api/notes/order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

// ============================================================================
// Validation Helpers
// ============================================================================

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::TitleRequired);
    }
    if trimmed.chars().count() > validation::MAX_TITLE_LENGTH {
        return Err(ApiError::TitleTooLong {
            max: validation::MAX_TITLE_LENGTH,
            actual: trimmed.chars().count(),
        });
    }
    Ok(())
}

/// Content must be non-empty. Whitespace alone counts as content.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.is_empty() {
        return Err(ApiError::ContentRequired);
    }
    if content.len() > validation::MAX_CONTENT_SIZE {
        return Err(ApiError::ContentTooLarge {
            max: validation::MAX_CONTENT_SIZE,
            actual: content.len(),
        });
    }
    Ok(())
}

pub fn parse_status(status: &str) -> Result<NoteStatus, ApiError> {
    status.parse().map_err(|_| ApiError::InvalidEnumValue {
        field: "status".to_string(),
        value: status.to_string(),
        valid: VALID_STATUSES.iter().map(|s| s.to_string()).collect(),
    })
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`; the leading `#` is optional.
pub fn is_hex_color(value: &str) -> bool {
    let digits = value.strip_prefix('#').unwrap_or(value);
    matches!(digits.len(), 3 | 4 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn validate_theme(theme: &Theme) -> Result<(), ApiError> {
    let colors = [
        ("theme.backgroundColor", Some(&theme.background_color)),
        ("theme.textColor", Some(&theme.text_color)),
        ("theme.gradientStart", theme.gradient_start.as_ref()),
        ("theme.gradientEnd", theme.gradient_end.as_ref()),
    ];
    for (field, value) in colors {
        if let Some(value) = value {
            if !is_hex_color(value) {
                return Err(ApiError::InvalidColor {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
    }

    if theme.border_radius > validation::MAX_BORDER_RADIUS {
        return Err(ApiError::ValidationFailed {
            field: "theme.borderRadius".to_string(),
            message: format!("must be at most {}", validation::MAX_BORDER_RADIUS),
        });
    }
    if theme.elevation > validation::MAX_ELEVATION {
        return Err(ApiError::ValidationFailed {
            field: "theme.elevation".to_string(),
            message: format!("must be at most {}", validation::MAX_ELEVATION),
        });
    }
    Ok(())
}

/// The requested rank must be a JSON integer.
pub fn parse_new_order(value: &serde_json::Value) -> Result<i64, ApiError> {
    value.as_i64().ok_or_else(|| ApiError::ValidationFailed {
        field: "newOrder".to_string(),
        message: format!("expected an integer, got {}", value),
    })
}

pub fn validate_batch(ids: &[Uuid]) -> Result<(), ApiError> {
    if ids.len() > validation::MAX_BATCH_SIZE {
        return Err(ApiError::ValidationFailed {
            field: "ids".to_string(),
            message: format!(
                "a reorder accepts at most {} notes, got {}",
                validation::MAX_BATCH_SIZE,
                ids.len()
            ),
        });
    }
    Ok(())
}

impl UpdateNoteRequest {
    /// Validate present fields and convert into a store update.
    pub fn into_update(self) -> Result<NoteUpdate, ApiError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        if let Some(theme) = &self.theme {
            validate_theme(theme)?;
        }
        let status = self.status.as_deref().map(parse_status).transpose()?;

        Ok(NoteUpdate {
            title: self.title.map(|t| t.trim().to_string()),
            content: self.content,
            theme: self.theme,
            status,
        })
    }
}
