//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! status codes or any other protocol-specific envelope.

use serde::Serialize;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A recipe, ingredient, unit, list, user or token does not exist.
    NotFound,
    /// A pagination cursor could not be decoded.
    Pagination,
    /// A transaction could not be opened.
    TransactionStart,
    /// A transaction could not be committed.
    TransactionCommit,
    /// The request fails a business rule (vote value, empty name, ...).
    Validation,
    /// The caller does not own the record it tries to change.
    Authorization,
    /// The record already exists, such as an account for a taken email.
    Conflict,
    /// Anything unclassified.
    Unhandled,
}

impl ErrorCode {
    const fn fallback_message(self) -> &'static str {
        match self {
            Self::NotFound => "record not found",
            Self::Pagination => "invalid pagination cursor",
            Self::TransactionStart => "transaction could not be started",
            Self::TransactionCommit => "transaction could not be committed",
            Self::Validation => "request failed validation",
            Self::Authorization => "not permitted",
            Self::Conflict => "record already exists",
            Self::Unhandled => "unexpected store failure",
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use recipe_manager::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("recipe 4 was not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
}

/// Short name used throughout the service layer.
pub type Error = DomainError;

/// Validation errors emitted by [`Error::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl DomainError {
    /// Create a new error; a blank message is replaced by a generic one for
    /// `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::try_new(code, message).unwrap_or_else(|_| Self {
            code,
            message: code.fallback_message().to_owned(),
        })
    }

    /// Fallible constructor that validates the message content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorValidationError::EmptyMessage`] for a blank message.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self { code, message })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Pagination`].
    pub fn pagination(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Pagination, message)
    }

    /// Convenience constructor for [`ErrorCode::TransactionStart`].
    pub fn transaction_start(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransactionStart, message)
    }

    /// Convenience constructor for [`ErrorCode::TransactionCommit`].
    pub fn transaction_commit(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransactionCommit, message)
    }

    /// Convenience constructor for [`ErrorCode::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Convenience constructor for [`ErrorCode::Authorization`].
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Authorization, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::Unhandled`].
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unhandled, message)
    }
}

#[cfg(test)]
mod tests;
