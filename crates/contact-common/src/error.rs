//! Common error types for contact service components.

use thiserror::Error;

/// Errors surfaced by the verification protocol.
///
/// Messages name the error class only. None of them reveal which field of a
/// token failed a check.
#[derive(Debug, Error)]
pub enum ContactError {
    /// Missing or malformed request fields
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Signature mismatch (wrong answer or tampered token)
    #[error("Unauthorized")]
    Unauthorized,

    /// Token expired; the client must start again at verify
    #[error("Token expired")]
    Gone,

    /// Rate budget for an operation is exhausted
    #[error("Rate limit exceeded: {operation}")]
    TooManyRequests {
        operation: String,
        /// Seconds until the budget resets
        retry_after_secs: u64,
    },

    /// Delivery or other internal failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContactError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized => 401,
            Self::Gone => 410,
            Self::TooManyRequests { .. } => 429,
            Self::Internal(_) => 500,
            Self::Config(_) => 500,
        }
    }

    /// Message safe to return to an unauthenticated client
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Gone => "token expired",
            Self::TooManyRequests { .. } => "too many requests",
            Self::Internal(_) | Self::Config(_) => "internal error",
        }
    }

    /// Seconds a client should wait before retrying, for `Retry-After`
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::TooManyRequests {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
