//! Error responses.
//!
//! Every failure leaves the API as
//! `{"error": "<CODE>", "message": "<text>", "status": <u16>}`, with a
//! `fields` map added for validation failures.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use carteira_core::auth::AccountError;
use carteira_core::ledger::LedgerError;
use carteira_core::receipt::ReceiptError;
use carteira_shared::AppError;
use serde::Serialize;
use validator::ValidationErrors;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    code: &'static str,
    fields: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    /// A 400 with a caller-facing message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// A 401 for missing or invalid credentials.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Usuário não autorizado".to_string()).into()
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            code: error.error_code(),
            error,
            fields: None,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self {
            code: err.error_code(),
            error: err.into(),
            fields: None,
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        Self {
            code: err.error_code(),
            error: err.into(),
            fields: None,
        }
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        Self {
            code: "INVALID_RECEIPT",
            error: AppError::Validation(err.user_message().to_string()),
            fields: None,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields: BTreeMap<String, Vec<String>> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        let message = fields
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "Dados inválidos".to_string());

        Self {
            code: "VALIDATION_ERROR",
            error: AppError::Validation(message),
            fields: Some(fields),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.is_internal() {
            tracing::error!(error = %self.error, code = self.code, "request failed");
        }

        let status = self.status();
        let body = ErrorBody {
            error: self.code,
            message: self.error.public_message(),
            status: status.as_u16(),
            fields: self.fields,
        };
        (status, Json(body)).into_response()
    }
}
