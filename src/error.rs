use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotemateError {
    #[error("Not in a notemate project. Run 'notemate init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .notemate/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stale note set: {0}")]
    StaleState(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, NotemateError>;

impl From<rusqlite::Error> for NotemateError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                NotemateError::Transient(format!("SQLite error: {}", e))
            }
            _ => NotemateError::Storage(format!("SQLite error: {}", e)),
        }
    }
}
