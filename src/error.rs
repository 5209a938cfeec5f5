//! Error types for dayplan

use thiserror::Error;

/// Result type alias for dayplan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dayplan
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Relational database error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector database error: {0}")]
    VectorDb(String),

    #[error("Not implemented for the {backend} backend: {operation}")]
    NotImplemented {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification callers use to tell data problems from model problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Storage,
    Generation,
    InvalidInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Storage => write!(f, "storage"),
            ErrorKind::Generation => write!(f, "generation"),
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn vector_db(msg: impl Into<String>) -> Self {
        Self::VectorDb(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_implemented(backend: &'static str, operation: &'static str) -> Self {
        Self::NotImplemented { backend, operation }
    }

    /// Which side of the system the failure came from.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Storage(_)
            | Error::Sqlite(_)
            | Error::Postgres(_)
            | Error::Json(_)
            | Error::Io(_)
            | Error::Embedding(_)
            | Error::VectorDb(_)
            | Error::NotImplemented { .. } => ErrorKind::Storage,
            Error::Generation(_) | Error::Http(_) => ErrorKind::Generation,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented { .. })
    }
}
