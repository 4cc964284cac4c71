//! Errors raised while decoding pagination cursors.

/// Failure to turn a client-supplied cursor back into a keyset position.
///
/// Cursors are opaque to clients, so either variant means the token was not
/// produced by this crate for the requested query shape (or was tampered
/// with). Callers must surface the error instead of falling back to the
/// first page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The token is not valid URL-safe base64.
    #[error("cursor is not a valid token: {message}")]
    InvalidEncoding {
        /// Decoder diagnostic.
        message: String,
    },
    /// The token decoded, but not into the expected cursor shape.
    #[error("cursor payload is malformed: {message}")]
    InvalidPayload {
        /// Deserialiser diagnostic.
        message: String,
    },
}

impl PaginationError {
    /// Create an [`PaginationError::InvalidEncoding`] error.
    pub fn invalid_encoding(message: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            message: message.into(),
        }
    }

    /// Create an [`PaginationError::InvalidPayload`] error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}
