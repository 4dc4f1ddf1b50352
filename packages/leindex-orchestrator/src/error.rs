//! The cross-cutting error taxonomy that every per-crate error type
//! unifies into at the request/response boundary.

use thiserror::Error;
use uuid::Uuid;

/// One variant per category the outer API is allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    NotFound,
    Unavailable,
    Timeout,
    Corrupted,
    Unsupported,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Corrupted => "corrupted",
            ErrorCategory::Unsupported => "unsupported",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The one error type that crosses the request/response boundary. Every
/// error carries a category, a machine-stable code, a short human sentence,
/// and — for `InvalidInput` — a suggested remediation. `Internal` always
/// carries a correlation id so a user-reported failure can be matched back
/// to the log line that raised it.
#[derive(Debug, Error)]
#[error("[{category}] {code}: {message}")]
pub struct LeIndexError {
    pub category: ErrorCategory,
    pub code: &'static str,
    pub message: String,
    pub remediation: Option<String>,
    pub correlation_id: Option<Uuid>,
}

pub type Result<T> = std::result::Result<T, LeIndexError>;

impl LeIndexError {
    pub fn new(category: ErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
            remediation: None,
            correlation_id: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidInput, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, code, message)
    }

    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unavailable, code, message)
    }

    pub fn timeout(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, code, message)
    }

    /// `Internal` errors always get a correlation id, logged alongside the
    /// `tracing::error!` call site that raises them.
    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        let correlation_id = Uuid::new_v4();
        let message = message.into();
        tracing::error!(%correlation_id, %code, %message, "internal error");
        Self {
            category: ErrorCategory::Internal,
            code,
            message,
            remediation: None,
            correlation_id: Some(correlation_id),
        }
    }

    pub fn corrupted(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Corrupted, code, message)
    }

    pub fn unsupported(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unsupported, code, message)
    }
}

impl From<leindex_storage::StorageError> for LeIndexError {
    fn from(err: leindex_storage::StorageError) -> Self {
        use leindex_storage::ErrorKind as K;
        match err.kind {
            K::NotFound => LeIndexError::not_found("storage.not_found", err.message),
            K::Full => LeIndexError::unavailable("storage.full", err.message)
                .with_remediation("free disk space or spill caches, then retry"),
            K::Integrity => LeIndexError::internal("storage.integrity", err.message),
            K::Transaction => LeIndexError::internal("storage.transaction", err.message),
            K::Database | K::Serialization => {
                LeIndexError::corrupted("storage.database", err.message)
            }
        }
    }
}

impl From<leindex_search::SearchError> for LeIndexError {
    fn from(err: leindex_search::SearchError) -> Self {
        use leindex_search::ErrorKind as K;
        match err.kind {
            K::InvalidQuery => LeIndexError::invalid_input("search.invalid_query", err.message)
                .with_remediation("shorten the query or simplify the regex pattern"),
            K::BackendUnavailable => {
                LeIndexError::unavailable("search.backend_unavailable", err.message)
            }
            K::Index => LeIndexError::internal("search.index", err.message),
        }
    }
}

impl From<leindex_pdg::PdgError> for LeIndexError {
    fn from(err: leindex_pdg::PdgError) -> Self {
        use leindex_pdg::ErrorKind as K;
        match err.kind {
            K::InvalidInput => LeIndexError::invalid_input("pdg.invalid_input", err.message),
            K::UnknownEndpoint => LeIndexError::invalid_input("pdg.unknown_endpoint", err.message),
            K::ProjectCollision => LeIndexError::internal("pdg.project_collision", err.message),
        }
    }
}
