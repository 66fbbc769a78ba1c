use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::Owner;
use crate::api::error::ApiError;
use crate::api::types::*;
use crate::api::AppState;
use crate::entity::Note;
use crate::storage::StatusCounts;

type ApiResult<T> = Result<T, ApiError>;

/// Unwrap a JSON body, reporting malformed payloads in the structured format.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(v)| v).map_err(|rejection| ApiError::ValidationFailed {
        field: "body".to_string(),
        message: rejection.body_text(),
    })
}

/// Ids that do not parse cannot name a stored note.
fn parse_note_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse().map_err(|_| ApiError::NoteNotFound { id: raw.to_string() })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// The owner's notes in rank order, optionally narrowed by `status` and `q`.
pub async fn list_notes(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Note>>> {
    let filter = query.into_filter()?;

    let store = state.store.lock().await;
    Ok(Json(store.list_filtered(owner.as_str(), &filter)?))
}

pub async fn note_stats(
    State(state): State<AppState>,
    owner: Owner,
) -> ApiResult<Json<StatusCounts>> {
    let store = state.store.lock().await;
    Ok(Json(store.count_by_status(owner.as_str())?))
}

pub async fn create_note(
    State(state): State<AppState>,
    owner: Owner,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let req = body(payload)?;

    let title = req.title.unwrap_or_default();
    let content = req.content.unwrap_or_default();
    validate_title(&title)?;
    validate_content(&content)?;

    let mut note = Note::new(owner.0, title.trim().to_string(), content);
    if let Some(theme) = req.theme {
        validate_theme(&theme)?;
        note.theme = theme;
    }
    if let Some(status) = req.status.as_deref() {
        note.status = parse_status(status)?;
    }

    let store = state.store.lock().await;
    let note = store.insert_note(&note)?;

    info!(owner = %note.base.owner, note_id = %note.base.id, order = note.order, "Created note");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let update = body(payload)?.into_update()?;

    let store = state.store.lock().await;
    Ok(Json(store.update_note(owner.as_str(), &id, update)?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_note_id(&id)?;

    let store = state.store.lock().await;
    let note = store.delete_note(owner.as_str(), &id)?;

    info!(owner = %owner.as_str(), note_id = %note.base.id, order = note.order, "Deleted note");
    Ok(Json(MessageResponse {
        message: "Note deleted".to_string(),
    }))
}

/// Move one note to a new rank. Out-of-range ranks are clamped.
pub async fn move_note(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    payload: Result<Json<MoveNoteRequest>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let new_order = parse_new_order(&body(payload)?.new_order)?;

    let mut store = state.store.lock().await;
    Ok(Json(store.move_note(owner.as_str(), &id, new_order)?))
}

/// Replace the owner's whole arrangement; returns the notes in their new order.
pub async fn reorder_notes(
    State(state): State<AppState>,
    owner: Owner,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Note>>> {
    let req = body(payload)?;
    validate_batch(&req.ids)?;

    let mut store = state.store.lock().await;
    Ok(Json(store.apply_ordering(owner.as_str(), &req.ids)?))
}
