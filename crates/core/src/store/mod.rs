//! Repository traits for user and transaction persistence.
//!
//! These traits are implemented by the db crate. [`InMemoryStore`] implements
//! both for tests.

#[cfg(any(test, feature = "test-util"))]
mod memory;

#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryStore;

use std::collections::BTreeMap;
use std::future::Future;

use carteira_shared::types::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::category::TransactionCategory;
use crate::ledger::types::{BalanceCommit, NewUser, Transaction, User};

/// Errors reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The user's version changed since it was read.
    #[error("stale balance version for user {0}")]
    StaleVersion(UserId),

    /// The transaction targeted by a commit no longer exists.
    #[error("transaction {0} no longer exists")]
    MissingTransaction(TransactionId),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Filters for a keyset-paginated history query.
///
/// Results are ordered by `(created_at, id)` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Owner of the transactions.
    pub user_id: UserId,
    /// Inclusive lower bound on `created_at`.
    pub from: DateTime<Utc>,
    /// Exclusive upper bound on `created_at`.
    pub until: DateTime<Utc>,
    /// Optional category equality filter.
    pub category: Option<TransactionCategory>,
    /// Only return records strictly after this `(created_at, id)` key.
    pub after: Option<(DateTime<Utc>, TransactionId)>,
    /// Maximum number of records.
    pub limit: u64,
}

impl TransactionQuery {
    /// Returns true if `tx` satisfies every filter of this query.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        tx.user_id == self.user_id
            && tx.created_at >= self.from
            && tx.created_at < self.until
            && self.category.is_none_or(|c| c == tx.category)
            && self
                .after
                .is_none_or(|key| (tx.created_at, tx.id) < key)
    }
}

/// User persistence.
pub trait UserRepository: Send + Sync {
    /// Finds a user by email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Creates a user with balance zero and version zero.
    ///
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    fn create(&self, input: NewUser) -> impl Future<Output = Result<User, StoreError>> + Send;
}

/// Transaction persistence.
pub trait TransactionRepository: Send + Sync {
    /// Finds a transaction by id, scoped to its owner.
    fn find_by_id(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, StoreError>> + Send;

    /// Returns the `limit` most recent transactions of a user, newest first.
    fn recent(
        &self,
        user_id: UserId,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Transaction>, StoreError>> + Send;

    /// Runs a filtered, keyset-paginated history query.
    fn search(
        &self,
        query: &TransactionQuery,
    ) -> impl Future<Output = Result<Vec<Transaction>, StoreError>> + Send;

    /// Sums the signed values of a user's transactions per category.
    ///
    /// Categories without transactions are absent from the result.
    fn sum_by_category(
        &self,
        user_id: UserId,
        categories: &[TransactionCategory],
    ) -> impl Future<Output = Result<BTreeMap<TransactionCategory, Decimal>, StoreError>> + Send;

    /// Applies a balance compare-and-swap and a transaction write atomically.
    ///
    /// Fails with [`StoreError::StaleVersion`] when the user's version no
    /// longer equals `commit.expected_version`, and with
    /// [`StoreError::MissingTransaction`] when an update or delete matches no
    /// record. Nothing is written in either case. Returns the updated user.
    fn commit(&self, commit: BalanceCommit) -> impl Future<Output = Result<User, StoreError>> + Send;
}
