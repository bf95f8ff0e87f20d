//! Ledger domain types.

use carteira_shared::auth::UserInfo;
use carteira_shared::types::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::TransactionCategory;
use crate::receipt::ReceiptImage;

/// A registered user and their running balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email, the external lookup key.
    pub email: String,
    /// Argon2id PHC hash.
    pub password_hash: String,
    /// Running balance, never negative once committed.
    pub balance: Decimal,
    /// Optimistic-concurrency token, bumped on every balance write.
    pub version: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the public profile of this user.
    #[must_use]
    pub fn profile(&self) -> UserInfo {
        UserInfo {
            id: self.id.into_inner(),
            name: self.name.clone(),
            email: self.email.clone(),
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Unique email.
    pub email: String,
    /// Argon2id PHC hash.
    pub password_hash: String,
}

/// A ledger transaction owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Category, which fixes the sign of `value`.
    #[serde(rename = "type")]
    pub category: TransactionCategory,
    /// Signed value: `>= 0` for additive categories, `<= 0` for subtractive ones.
    pub value: Decimal,
    /// Creation timestamp, immutable and used as the sort key.
    pub created_at: DateTime<Utc>,
    /// Owning user.
    pub user_id: UserId,
    /// Receipt image as a `data:` URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Transaction {
    /// Returns the unsigned magnitude of the value.
    #[must_use]
    pub fn magnitude(&self) -> Decimal {
        self.value.abs()
    }
}

/// Pending write to a transaction record, committed together with a balance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionWrite {
    /// Insert a new record.
    Insert(Transaction),
    /// Replace the value of an existing record.
    UpdateValue {
        /// Record to update.
        id: TransactionId,
        /// New signed value.
        value: Decimal,
    },
    /// Remove a record.
    Delete(TransactionId),
}

/// One atomic unit: a balance compare-and-swap plus a transaction write.
///
/// The store applies both or neither. The balance write only succeeds while
/// the user's version still equals `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCommit {
    /// User whose balance changes.
    pub user_id: UserId,
    /// Version read before computing `new_balance`.
    pub expected_version: i64,
    /// Balance after the mutation.
    pub new_balance: Decimal,
    /// Record write applied in the same unit.
    pub write: TransactionWrite,
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Owner email, taken from the verified token.
    pub email: String,
    /// Positive amount entered by the user.
    pub amount: Decimal,
    /// Category chosen by the user.
    pub category: TransactionCategory,
    /// Optional receipt, already size-checked at the transport boundary.
    pub receipt: Option<ReceiptImage>,
}

/// Acknowledgement returned by every ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerReceipt {
    /// Human-readable pt-BR message.
    pub message: String,
    /// HTTP-style status code (201 for create, 200 otherwise).
    pub status: u16,
    /// Transaction affected by the mutation.
    #[serde(skip)]
    pub transaction_id: TransactionId,
    /// Balance after the mutation.
    #[serde(skip)]
    pub balance: Decimal,
}
