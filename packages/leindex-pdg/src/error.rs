//! Error types for `leindex-pdg`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Edge references a node id that does not exist in the graph.
    UnknownEndpoint,
    /// `upsert_node` saw the same `symbol_id` under a different `project_id`.
    ProjectCollision,
    /// Invariant violated by caller input (e.g. zero budget).
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownEndpoint => "unknown_endpoint",
            ErrorKind::ProjectCollision => "project_collision",
            ErrorKind::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct PdgError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PdgError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_endpoint(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownEndpoint, message)
    }

    pub fn project_collision(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProjectCollision, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }
}

pub type Result<T> = std::result::Result<T, PdgError>;
