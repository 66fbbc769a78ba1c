//! Notes API as seen from a client, with an HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::Note;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response; worth retrying.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {message}")]
    Status {
        status: u16,
        error_type: Option<String>,
        message: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Status { status, .. } => *status == 503,
            ClientError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// The calls the reorder session needs from the server.
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// All of the caller's notes in display order.
    async fn list_notes(&self) -> Result<Vec<Note>, ClientError>;

    async fn move_note(&self, id: Uuid, new_order: i64) -> Result<Note, ClientError>;

    /// Persist a full arrangement; returns the notes in their new order.
    async fn reorder(&self, ids: &[Uuid]) -> Result<Vec<Note>, ClientError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    error_type: Option<String>,
}

pub struct HttpNotesApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpNotesApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (message, error_type) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.error, body.error_type),
                Err(_) => (text, None),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                error_type,
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl NotesApi for HttpNotesApi {
    async fn list_notes(&self) -> Result<Vec<Note>, ClientError> {
        self.send(self.request(Method::GET, "/api/notes")).await
    }

    async fn move_note(&self, id: Uuid, new_order: i64) -> Result<Note, ClientError> {
        let path = format!("/api/notes/{}/order", id);
        self.send(
            self.request(Method::PATCH, &path)
                .json(&json!({ "newOrder": new_order })),
        )
        .await
    }

    async fn reorder(&self, ids: &[Uuid]) -> Result<Vec<Note>, ClientError> {
        self.send(
            self.request(Method::PUT, "/api/notes/order")
                .json(&json!({ "ids": ids })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Network("refused".into()).is_transient());
        assert!(ClientError::Status {
            status: 503,
            error_type: Some("Transient".into()),
            message: "busy".into()
        }
        .is_transient());
        assert!(!ClientError::Status {
            status: 409,
            error_type: Some("StaleState".into()),
            message: "changed".into()
        }
        .is_transient());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpNotesApi::new("http://127.0.0.1:5000/", "t").unwrap();
        assert_eq!(api.base_url, "http://127.0.0.1:5000");
    }
}
