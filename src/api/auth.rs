//! Owner identity extraction.
//!
//! Every `/api/notes` handler takes an [`Owner`]; requests without a bearer
//! token that maps to a configured owner are rejected before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::AppState;

/// The authenticated owner of a request. All ordering is scoped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            debug!(path = %parts.uri.path(), "Missing bearer token");
            return Err(ApiError::Unauthenticated);
        };

        match state.config.owner_for_token(token) {
            Some(owner) => Ok(Owner(owner.to_string())),
            None => {
                debug!(path = %parts.uri.path(), "Unknown bearer token");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}
