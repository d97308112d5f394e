//! Error types for storage and flush operations.

/// Errors produced by a [`Storage`](crate::Storage) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("injected storage fault")]
    Injected,
}

/// Errors that end a flush cycle early. Undrained events stay queued.
#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error("no formatter registered for id {0:?}")]
    UnknownFormatter(String),

    #[error("host went away before signalling readiness")]
    NotReady,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
