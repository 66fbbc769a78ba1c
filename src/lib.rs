pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod order;
pub mod storage;

pub use client::{HttpNotesApi, NotesApi, ReorderSession};
pub use config::NotemateConfig;
pub use entity::{Note, NoteStatus, Theme};
pub use error::{NotemateError, Result};
pub use storage::NoteStore;
