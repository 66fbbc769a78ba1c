//! HTTP API for notes and their ordering.
//!
//! Routes (all but `/health` require `Authorization: Bearer <token>`):
//!
//! | Method | Path                    | Purpose                                  |
//! |--------|-------------------------|------------------------------------------|
//! | GET    | `/health`               | liveness                                 |
//! | GET    | `/api/notes`            | notes by rank, `?status=` and `?q=`      |
//! | GET    | `/api/notes/stats`      | note counts per status                   |
//! | POST   | `/api/notes`            | create, appended at the end              |
//! | PATCH  | `/api/notes/{id}`       | edit fields (never the rank)             |
//! | DELETE | `/api/notes/{id}`       | delete, leaving a rank gap               |
//! | PATCH  | `/api/notes/{id}/order` | move one note (`{newOrder}`)             |
//! | PUT    | `/api/notes/order`      | resequence everything (`{ids}`)          |

pub mod auth;
pub mod error;
pub mod handlers;
pub mod types;

pub use auth::Owner;
pub use error::ApiError;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, put};
use axum::Router;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::NotemateConfig;
use crate::error::Result;
use crate::storage::NoteStore;

/// Shared server state.
///
/// The store sits behind one async mutex, so every resequencing operation
/// runs as a single serialized unit.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<NoteStore>>,
    pub config: Arc<NotemateConfig>,
}

impl AppState {
    pub fn new(store: NoteStore, config: NotemateConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route("/api/notes/stats", get(handlers::note_stats))
        .route("/api/notes/order", put(handlers::reorder_notes))
        .route(
            "/api/notes/{id}",
            patch(handlers::update_note).delete(handlers::delete_note),
        )
        .route("/api/notes/{id}/order", patch(handlers::move_note))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), duration_ms, "Request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), duration_ms, "Request completed");
    }
    response
}

/// Bind and serve until Ctrl-C.
pub async fn serve(store: NoteStore, config: NotemateConfig) -> Result<()> {
    let bind = config.bind.clone();
    let app = router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(bind = %bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request as HttpRequest, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::entity::Note;

    fn setup_app() -> (Router, AppState) {
        let store = NoteStore::open_in_memory().unwrap();
        let mut config = NotemateConfig::default();
        config.tokens.insert("alice-token".to_string(), "alice".to_string());
        config.tokens.insert("bob-token".to_string(), "bob".to_string());
        let state = AppState::new(store, config);
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, token: &str, title: &str) -> Note {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/notes",
            Some(token),
            Some(json!({"title": title, "content": format!("{} body", title)})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        serde_json::from_value(body).unwrap()
    }

    async fn titles(app: &Router, token: &str) -> Vec<String> {
        let (status, body) = send(app, Method::GET, "/api/notes", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        let notes: Vec<Note> = serde_json::from_value(body).unwrap();
        notes.into_iter().map(|n| n.base.title).collect()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let (app, _) = setup_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_requests_without_owner_fail_closed() {
        let (app, state) = setup_app();

        let (status, body) = send(&app, Method::GET, "/api/notes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorType"], "Unauthenticated");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/notes",
            Some("forged"),
            Some(json!({"title": "x", "content": "y"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            None,
            Some(json!({"ids": []})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert_eq!(state.store.lock().await.count("alice").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_appends_from_zero() {
        let (app, _) = setup_app();
        let first = create(&app, "alice-token", "First").await;
        let second = create(&app, "alice-token", "Second").await;
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
        assert_eq!(first.base.owner, "alice");
        assert_eq!(first.theme.background_color, "#ffffff");
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let (app, _) = setup_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/notes",
            Some("alice-token"),
            Some(json!({"content": "no title"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/notes",
            Some("alice-token"),
            Some(json!({"title": "t", "content": "c", "theme": {"backgroundColor": "purple"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "InvalidInput");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/notes",
            Some("alice-token"),
            Some(json!({"title": "t", "content": "c", "status": "deleted"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_endpoint_both_directions() {
        let (app, _) = setup_app();
        let mut notes = Vec::new();
        for title in ["A", "B", "C", "D", "E"] {
            notes.push(create(&app, "alice-token", title).await);
        }

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}/order", notes[0].base.id),
            Some("alice-token"),
            Some(json!({"newOrder": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"], 3);
        assert_eq!(titles(&app, "alice-token").await, vec!["B", "C", "D", "A", "E"]);

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}/order", notes[4].base.id),
            Some("alice-token"),
            Some(json!({"newOrder": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&app, "alice-token").await, vec!["E", "B", "C", "D", "A"]);
    }

    #[tokio::test]
    async fn test_move_endpoint_errors() {
        let (app, _) = setup_app();
        let note = create(&app, "alice-token", "Mine").await;
        let uri = format!("/api/notes/{}/order", note.base.id);

        let (status, body) = send(
            &app,
            Method::PATCH,
            &uri,
            Some("alice-token"),
            Some(json!({"newOrder": "first"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "InvalidInput");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &uri,
            Some("bob-token"),
            Some(json!({"newOrder": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorType"], "NotFound");

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/notes/not-a-uuid/order",
            Some("alice-token"),
            Some(json!({"newOrder": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_endpoint() {
        let (app, _) = setup_app();
        let a = create(&app, "alice-token", "A").await;
        let b = create(&app, "alice-token", "B").await;
        let c = create(&app, "alice-token", "C").await;

        let ids = json!({"ids": [c.base.id, a.base.id, b.base.id]});
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            Some("alice-token"),
            Some(ids.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let notes: Vec<Note> = serde_json::from_value(body).unwrap();
        let orders: Vec<(String, i64)> =
            notes.into_iter().map(|n| (n.base.title, n.order)).collect();
        assert_eq!(
            orders,
            vec![("C".to_string(), 0), ("A".to_string(), 1), ("B".to_string(), 2)]
        );

        // Same list again is accepted and changes nothing.
        let (status, _) = send(&app, Method::PUT, "/api/notes/order", Some("alice-token"), Some(ids)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&app, "alice-token").await, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_stale_list() {
        let (app, _) = setup_app();
        let a = create(&app, "alice-token", "A").await;
        let b = create(&app, "alice-token", "B").await;
        let bobs = create(&app, "bob-token", "Bob").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            Some("alice-token"),
            Some(json!({"ids": [b.base.id]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errorType"], "StaleState");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            Some("alice-token"),
            Some(json!({"ids": [b.base.id, bobs.base.id]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            Some("alice-token"),
            Some(json!({"ids": [a.base.id, a.base.id]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "InvalidInput");

        assert_eq!(titles(&app, "alice-token").await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_malformed_body() {
        let (app, _) = setup_app();
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/notes/order",
            Some("alice-token"),
            Some(json!({"ids": ["nope"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_update_and_delete_keep_ranks() {
        let (app, _) = setup_app();
        let a = create(&app, "alice-token", "A").await;
        let b = create(&app, "alice-token", "B").await;
        let c = create(&app, "alice-token", "C").await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}", c.base.id),
            Some("alice-token"),
            Some(json!({"title": "C2", "theme": {"backgroundColor": "#ff0000"}, "status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"], 2);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["theme"]["backgroundColor"], "#ff0000");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/notes/{}", b.base.id),
            Some("alice-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Note deleted");

        let (_, body) = send(&app, Method::GET, "/api/notes", Some("alice-token"), None).await;
        let notes: Vec<Note> = serde_json::from_value(body).unwrap();
        assert_eq!(notes[0].base.id, a.base.id);
        assert_eq!(notes[0].order, 0);
        assert_eq!(notes[1].order, 2);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/notes/{}", b.base.id),
            Some("alice-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_owners_do_not_see_each_other() {
        let (app, _) = setup_app();
        create(&app, "alice-token", "Alice's").await;
        create(&app, "bob-token", "Bob's").await;

        assert_eq!(titles(&app, "alice-token").await, vec!["Alice's"]);
        assert_eq!(titles(&app, "bob-token").await, vec!["Bob's"]);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_search() {
        let (app, _) = setup_app();
        let a = create(&app, "alice-token", "Groceries").await;
        create(&app, "alice-token", "Reading list").await;
        let c = create(&app, "alice-token", "Errands").await;
        create(&app, "bob-token", "Bob's groceries").await;

        send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}", c.base.id),
            Some("alice-token"),
            Some(json!({"content": "pick up GROCERIES", "status": "completed"})),
        )
        .await;
        send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}/order", c.base.id),
            Some("alice-token"),
            Some(json!({"newOrder": 0})),
        )
        .await;

        let listed = |uri: &'static str| {
            let app = app.clone();
            async move {
                let (status, body) = send(&app, Method::GET, uri, Some("alice-token"), None).await;
                assert_eq!(status, StatusCode::OK, "{}", body);
                let notes: Vec<Note> = serde_json::from_value(body).unwrap();
                notes.into_iter().map(|n| n.base.title).collect::<Vec<_>>()
            }
        };

        assert_eq!(listed("/api/notes?q=groceries").await, vec!["Errands", "Groceries"]);
        assert_eq!(listed("/api/notes?status=completed").await, vec!["Errands"]);
        assert_eq!(listed("/api/notes?status=active&q=GROC").await, vec!["Groceries"]);
        assert_eq!(
            listed("/api/notes?status=all").await,
            vec!["Errands", "Groceries", "Reading list"]
        );
        assert!(listed("/api/notes?q=nothing%20here").await.is_empty());

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/notes?status=deleted",
            Some("alice-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "InvalidInput");

        // Filtering never rewrites ranks.
        let (_, body) = send(&app, Method::GET, "/api/notes", Some("alice-token"), None).await;
        let notes: Vec<Note> = serde_json::from_value(body).unwrap();
        assert_eq!(notes[1].base.id, a.base.id);
        assert_eq!(notes[1].order, 1);
    }

    #[tokio::test]
    async fn test_stats_counts_per_status() {
        let (app, _) = setup_app();
        let a = create(&app, "alice-token", "A").await;
        create(&app, "alice-token", "B").await;
        create(&app, "alice-token", "C").await;
        create(&app, "bob-token", "Bob's").await;

        send(
            &app,
            Method::PATCH,
            &format!("/api/notes/{}", a.base.id),
            Some("alice-token"),
            Some(json!({"status": "archived"})),
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/api/notes/stats", Some("alice-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"active": 2, "archived": 1, "completed": 0, "total": 3}));

        let (status, _) = send(&app, Method::GET, "/api/notes/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
