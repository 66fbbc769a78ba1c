mod sqlite_store;

pub use sqlite_store::{NoteFilter, NoteStore, NoteUpdate, StatusCounts, NOTEMATE_DIR};
