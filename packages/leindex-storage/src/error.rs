//! Error types for `leindex-storage`.

use std::fmt;
use thiserror::Error;

/// Coarse classification, chosen so every variant maps cleanly onto the
/// cross-cutting error taxonomy owned by `leindex-orchestrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Underlying database I/O or schema error.
    Database,
    /// (De)serialization of a stored payload failed.
    Serialization,
    /// Requested row does not exist.
    NotFound,
    /// A transaction was rolled back.
    Transaction,
    /// Foreign-key / referential-integrity violation (edge to unknown symbol).
    Integrity,
    /// Disk is full or the store is otherwise out of capacity.
    Full,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Full => "full",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type. Carries enough structure for the orchestrator to map
/// it onto `{InvalidInput, NotFound, Unavailable, Internal, Corrupted}`
/// without re-deriving the reason from a string.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Integrity, message)
    }

    pub fn full(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Full, message)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        // SQLITE_FULL surfaces as an Sqlite error with a specific code; rusqlite
        // exposes it via the extended result code on `SqliteFailure`.
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if e.code == rusqlite::ErrorCode::DiskFull {
                return StorageError::full(format!("sqlite disk full: {err}")).with_source(err);
            }
        }
        StorageError::database(format!("sqlite error: {err}")).with_source(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::new(ErrorKind::Serialization, format!("json error: {err}")).with_source(err)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
