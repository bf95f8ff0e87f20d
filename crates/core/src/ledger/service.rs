//! Ledger service: transaction mutations together with the balance update.
//!
//! Each mutation reads the user (and the target transaction), plans the new
//! balance with [`super::balance`], then hands the store one
//! [`BalanceCommit`]. A commit that loses a race against another writer is
//! re-planned from a fresh read, up to `max_conflict_retries` times.

use std::future::Future;
use std::sync::Arc;

use carteira_shared::types::TransactionId;
use carteira_shared::types::money::validate_amount;
use chrono::Utc;
use rust_decimal::Decimal;

use super::balance::{plan_create, plan_delete, plan_edit};
use super::error::LedgerError;
use super::types::{
    BalanceCommit, CreateTransactionInput, LedgerReceipt, Transaction, TransactionWrite, User,
};
use crate::receipt::ReceiptImage;
use crate::store::{TransactionRepository, UserRepository};

/// Default number of re-plans after a lost balance race.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Ledger service over a user store and a transaction store.
#[derive(Debug)]
pub struct LedgerService<U, T> {
    users: Arc<U>,
    transactions: Arc<T>,
    max_conflict_retries: u32,
}

impl<U, T> Clone for LedgerService<U, T> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            transactions: Arc::clone(&self.transactions),
            max_conflict_retries: self.max_conflict_retries,
        }
    }
}

impl<U: UserRepository, T: TransactionRepository> LedgerService<U, T> {
    /// Creates a ledger service.
    #[must_use]
    pub fn new(users: Arc<U>, transactions: Arc<T>) -> Self {
        Self {
            users,
            transactions,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Sets how many times a conflicting commit is re-planned.
    #[must_use]
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Records a new transaction and applies it to the balance.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no user has the email
    /// - `InvalidAmount` if the amount is not positive or has more than two decimals
    /// - `InsufficientFunds` if the balance would go negative
    /// - `ConcurrentModification` if retries ran out
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> Result<LedgerReceipt, LedgerError> {
        let amount = validate_amount(input.amount)?;
        let id = TransactionId::new();
        let created_at = Utc::now();
        let data_uri = input.receipt.as_ref().map(ReceiptImage::to_data_uri);

        let email = input.email.as_str();
        let category = input.category;
        let file = data_uri.as_ref();

        let user = self
            .retrying("create", move || async move {
                let user = self.user_by_email(email).await?;
                let (change, value) = plan_create(user.balance, category, amount)?;
                let tx = Transaction {
                    id,
                    category,
                    value,
                    created_at,
                    user_id: user.id,
                    file: file.cloned(),
                };
                self.commit(&user, change.next, TransactionWrite::Insert(tx))
                    .await
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            transaction_id = %id,
            category = %category,
            balance = %user.balance,
            "transaction created"
        );

        Ok(LedgerReceipt {
            message: "Transação criada com sucesso".to_string(),
            status: 201,
            transaction_id: id,
            balance: user.balance,
        })
    }

    /// Deletes a transaction owned by the user and reverses its value.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` / `TransactionNotFound`
    /// - `InsufficientFunds` if the reversal would drive the balance negative
    /// - `ConcurrentModification` if retries ran out
    pub async fn delete_transaction(
        &self,
        email: &str,
        id: TransactionId,
    ) -> Result<LedgerReceipt, LedgerError> {
        let user = self
            .retrying("delete", move || async move {
                let (user, tx) = self.owned_transaction(email, id).await?;
                let change = plan_delete(user.balance, &tx)?;
                self.commit(&user, change.next, TransactionWrite::Delete(id))
                    .await
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            transaction_id = %id,
            balance = %user.balance,
            "transaction deleted"
        );

        Ok(LedgerReceipt {
            message: "Transação removida com sucesso".to_string(),
            status: 200,
            transaction_id: id,
            balance: user.balance,
        })
    }

    /// Changes the magnitude of a transaction owned by the user.
    ///
    /// The category never changes, so the stored sign is kept.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` / `TransactionNotFound`
    /// - `InvalidAmount` if the new magnitude is not a valid amount
    /// - `InsufficientFunds` if the balance would go negative
    /// - `ConcurrentModification` if retries ran out
    pub async fn edit_transaction(
        &self,
        email: &str,
        id: TransactionId,
        new_amount: Decimal,
    ) -> Result<LedgerReceipt, LedgerError> {
        let user = self
            .retrying("edit", move || async move {
                let (user, tx) = self.owned_transaction(email, id).await?;
                let magnitude = validate_amount(new_amount)?;
                let (change, value) = plan_edit(user.balance, &tx, magnitude)?;
                self.commit(&user, change.next, TransactionWrite::UpdateValue { id, value })
                    .await
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            transaction_id = %id,
            balance = %user.balance,
            "transaction edited"
        );

        Ok(LedgerReceipt {
            message: "Transação atualizada com sucesso".to_string(),
            status: 200,
            transaction_id: id,
            balance: user.balance,
        })
    }

    async fn user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(email.to_string()))
    }

    async fn owned_transaction(
        &self,
        email: &str,
        id: TransactionId,
    ) -> Result<(User, Transaction), LedgerError> {
        let user = self.user_by_email(email).await?;
        let tx = self
            .transactions
            .find_by_id(user.id, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        Ok((user, tx))
    }

    async fn commit(
        &self,
        user: &User,
        new_balance: Decimal,
        write: TransactionWrite,
    ) -> Result<User, LedgerError> {
        let commit = BalanceCommit {
            user_id: user.id,
            expected_version: user.version,
            new_balance,
            write,
        };
        Ok(self.transactions.commit(commit).await?)
    }

    /// Runs `attempt` until it succeeds, fails for a reason other than a lost
    /// race, or the retry budget is spent.
    async fn retrying<F, Fut, R>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<R, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, LedgerError>>,
    {
        let mut conflicts = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && conflicts < self.max_conflict_retries => {
                    conflicts += 1;
                    tracing::debug!(
                        operation,
                        attempt = conflicts,
                        "balance version moved, re-planning"
                    );
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        operation,
                        conflicts,
                        "giving up after repeated balance conflicts"
                    );
                    return Err(err);
                }
                other => return other,
            }
        }
    }
}
