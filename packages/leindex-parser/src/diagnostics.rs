//! Parse failure taxonomy (Failure semantics).

use thiserror::Error;

/// Non-fatal parse diagnostics. A file producing these still yields whatever
/// symbols could be extracted; callers decide whether to surface them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Diag {
    #[error("no grammar registered for this language")]
    Unsupported,

    #[error("syntax error recovered at byte offset {byte_offset}")]
    PartialParse { byte_offset: usize },

    #[error("source bytes are not valid UTF-8")]
    InvalidEncoding,
}
