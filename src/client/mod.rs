//! Client side of drag-and-drop reordering.
//!
//! [`ReorderSession`] applies drops to the displayed list immediately, waits
//! for the debounce window to close, then persists the final arrangement in
//! one call. A failed call triggers a refetch of the authoritative order.

mod api;
mod controller;
mod debounce;
mod session;

pub use api::{ClientError, HttpNotesApi, NotesApi};
pub use controller::{ControllerError, Dispatch, ReorderController, ReorderState};
pub use debounce::Debouncer;
pub use session::ReorderSession;
