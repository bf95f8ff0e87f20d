//! Ledger error types.
//!
//! Covers lookup misses, amount validation, the non-negative balance rule,
//! lost balance races and store failures.

use carteira_shared::AppError;
use carteira_shared::types::{MoneyError, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::category::TransactionCategory;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No user with this email.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Transaction not found (or not owned by the caller).
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Amount failed validation.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    /// The mutation would make the balance negative.
    #[error("Insufficient funds for {category}: balance {balance}, change {delta}")]
    InsufficientFunds {
        /// Category of the transaction being created, edited or deleted.
        category: TransactionCategory,
        /// Balance before the mutation.
        balance: Decimal,
        /// Signed change that was rejected.
        delta: Decimal,
    },

    /// Another request updated the balance first and retries ran out.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Store failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) => 400,
            Self::UserNotFound(_) | Self::TransactionNotFound(_) => 404,
            Self::ConcurrentModification => 409,
            Self::InsufficientFunds { .. } => 422,
            Self::Store(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }

    /// Returns the pt-BR message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UserNotFound(_) => "Usuário não encontrado".to_string(),
            Self::TransactionNotFound(_) => "Transação não encontrada".to_string(),
            Self::InvalidAmount(e) => e.user_message().to_string(),
            Self::InsufficientFunds { category, .. } => {
                format!("Saldo insuficiente para realizar operação {}", category.label())
            }
            Self::ConcurrentModification => {
                "O saldo foi alterado por outra operação, tente novamente".to_string()
            }
            Self::Store(_) => "Erro processando transação".to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StaleVersion(_) => Self::ConcurrentModification,
            StoreError::MissingTransaction(id) => Self::TransactionNotFound(id),
            StoreError::Duplicate(msg) | StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.user_message();
        match err {
            LedgerError::UserNotFound(_) | LedgerError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::InvalidAmount(_) => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(message),
            LedgerError::ConcurrentModification => Self::Conflict(message),
            LedgerError::Store(detail) => Self::Database(detail),
        }
    }
}
