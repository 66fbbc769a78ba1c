//! Drag-and-drop reorder session: optimistic local moves, one debounced save.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use super::api::{ClientError, NotesApi};
use super::controller::{ControllerError, ReorderController, ReorderState};
use super::debounce::Debouncer;
use crate::entity::Note;

/// Shared between the session handle and the debounce timer task.
struct Inner {
    api: Arc<dyn NotesApi>,
    controller: Mutex<ReorderController>,
    debouncer: Mutex<Debouncer>,
    /// Serializes network calls so arrangements reach the server in order.
    send_lock: tokio::sync::Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    async fn dispatch(&self) {
        let _turn = self.send_lock.lock().await;

        let dispatch = {
            let mut controller = lock(&self.controller);
            controller.take_dispatch()
        };
        let Some(dispatch) = dispatch else {
            return;
        };

        match self.api.reorder(&dispatch.ids).await {
            Ok(notes) => {
                info!(count = notes.len(), revision = dispatch.revision, "Reorder saved");
                lock(&self.controller).on_success(&dispatch, notes);
            }
            Err(err) => {
                warn!(error = %err, revision = dispatch.revision, "Reorder failed, refetching");
                lock(&self.controller).on_failure();
                self.reconcile().await;
            }
        }
    }

    async fn reconcile(&self) {
        match self.api.list_notes().await {
            Ok(notes) => lock(&self.controller).on_refetched(notes),
            Err(err) => {
                warn!(error = %err, "Refetch failed, restoring last saved order");
                lock(&self.controller).on_refetch_failed();
            }
        }
    }
}

#[derive(Clone)]
pub struct ReorderSession {
    inner: Arc<Inner>,
}

impl ReorderSession {
    pub fn new(api: Arc<dyn NotesApi>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                controller: Mutex::new(ReorderController::default()),
                debouncer: Mutex::new(Debouncer::new(debounce)),
                send_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Fetch the authoritative list and discard any local state.
    pub async fn load(&self) -> Result<Vec<Note>, ClientError> {
        let _turn = self.inner.send_lock.lock().await;
        let notes = self.inner.api.list_notes().await?;
        lock(&self.inner.controller).reset(notes.clone());
        Ok(notes)
    }

    /// Apply a drop locally and (re)start the debounce window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn drop_note(&self, from: usize, to: usize) -> Result<bool, ControllerError> {
        let changed = lock(&self.inner.controller).apply_drop(from, to)?;
        if changed {
            let inner = Arc::clone(&self.inner);
            lock(&self.inner.debouncer).schedule(async move { inner.dispatch().await });
        }
        Ok(changed)
    }

    /// Send any pending arrangement now instead of waiting for the window.
    pub async fn flush(&self) {
        lock(&self.inner.debouncer).cancel();
        self.inner.dispatch().await;
    }

    /// Move one note through the single-move endpoint, then refetch since
    /// the server shifted its neighbours too.
    pub async fn move_single(&self, id: Uuid, new_order: i64) -> Result<Note, ClientError> {
        self.flush().await;

        let _turn = self.inner.send_lock.lock().await;
        let result = self.inner.api.move_note(id, new_order).await;
        match &result {
            Ok(moved) => lock(&self.inner.controller).on_moved(moved),
            Err(err) => {
                warn!(error = %err, note_id = %id, "Move failed, refetching");
                lock(&self.inner.controller).on_failure();
            }
        }
        self.inner.reconcile().await;
        result
    }

    pub fn displayed(&self) -> Vec<Note> {
        lock(&self.inner.controller).displayed().to_vec()
    }

    pub fn confirmed(&self) -> Vec<Note> {
        lock(&self.inner.controller).confirmed().to_vec()
    }

    pub fn state(&self) -> ReorderState {
        lock(&self.inner.controller).state()
    }
}
