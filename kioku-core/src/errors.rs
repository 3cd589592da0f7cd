use crate::{CardKind, LocalId, RemoteRef};
use thiserror::Error;

/// Failures reported by a [`crate::DocumentStore`] implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The collection schema has no property with this name. Recoverable by
    /// dropping the filter or sort that named it.
    #[error("property not found: {}", .property.as_deref().unwrap_or("<unnamed>"))]
    PropertyNotFound { property: Option<String> },
    #[error("document not found: {0}")]
    DocumentNotFound(RemoteRef),
    #[error("request timed out")]
    Timeout,
    #[error("remote error {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, StoreError::PropertyNotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] StoreError),
    #[error("write failed: {0}")]
    Write(#[source] StoreError),
    #[error("no {kind} card {local_id} in level {level}: {reason}")]
    UnresolvableTarget {
        kind: CardKind,
        level: String,
        local_id: LocalId,
        reason: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
}
