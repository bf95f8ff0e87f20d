//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every layer converts its own error enum into one of these before it
/// reaches the HTTP boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid bearer token.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body over the upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The balance would become negative.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Conflict (duplicate entry or concurrent modification).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::InsufficientFunds(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message that may be shown to the caller.
    ///
    /// Database and internal failures collapse to a generic message; their
    /// detail only goes to the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::PayloadTooLarge(msg)
            | Self::InsufficientFunds(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Erro interno, tente novamente".to_string(),
        }
    }

    /// Returns true for errors whose detail must not leave the server.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}
