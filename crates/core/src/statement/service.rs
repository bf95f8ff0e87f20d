//! Statement service.

use std::sync::Arc;

use carteira_shared::types::CursorPage;
use carteira_shared::types::money::to_money_scale;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::types::{InvestmentSummary, SearchParams, TransactionPage, UserStatement};
use crate::ledger::LedgerError;
use crate::ledger::category::TransactionCategory;
use crate::ledger::types::User;
use crate::store::{TransactionQuery, TransactionRepository, UserRepository};

/// Default number of transactions in a statement.
pub const DEFAULT_STATEMENT_SIZE: u64 = 30;

/// Read-only queries over users and their transactions.
#[derive(Debug)]
pub struct StatementService<U, T> {
    users: Arc<U>,
    transactions: Arc<T>,
}

impl<U, T> Clone for StatementService<U, T> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            transactions: Arc::clone(&self.transactions),
        }
    }
}

impl<U: UserRepository, T: TransactionRepository> StatementService<U, T> {
    /// Creates a statement service.
    #[must_use]
    pub fn new(users: Arc<U>, transactions: Arc<T>) -> Self {
        Self {
            users,
            transactions,
        }
    }

    /// Returns the profile and the `size` most recent transactions.
    ///
    /// A failed history read is logged and yields an empty statement; only a
    /// failed profile read is an error. `size == 0` skips the history read.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `Store` if the profile cannot be read.
    pub async fn user_statement(&self, email: &str, size: u64) -> Result<UserStatement, LedgerError> {
        let user = self.user_by_email(email).await?;
        let mut statement = UserStatement {
            user: user.profile(),
            statement: Vec::new(),
        };

        if size < 1 {
            return Ok(statement);
        }

        match self.transactions.recent(user.id, size).await {
            Ok(recent) => statement.statement = recent,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "failed to load statement history");
            }
        }

        Ok(statement)
    }

    /// Searches a user's history within a day range, newest first.
    ///
    /// Inverted ranges are swapped. The range covers whole UTC days, from the
    /// start of `from` to the end of `to`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `TransactionNotFound` when the cursor is not
    /// one of the user's transactions, or `Store`.
    pub async fn search_transactions(
        &self,
        params: SearchParams,
    ) -> Result<TransactionPage, LedgerError> {
        let user = self.user_by_email(&params.email).await?;

        let (first_day, last_day) = if params.from > params.to {
            (params.to, params.from)
        } else {
            (params.from, params.to)
        };

        let after = match params.cursor {
            Some(cursor) => {
                let anchor = self
                    .transactions
                    .find_by_id(user.id, cursor)
                    .await?
                    .ok_or(LedgerError::TransactionNotFound(cursor))?;
                Some((anchor.created_at, anchor.id))
            }
            None => None,
        };

        let query = TransactionQuery {
            user_id: user.id,
            from: start_of_day(first_day),
            until: end_of_day_exclusive(last_day),
            category: params.category,
            after,
            limit: params.per_page.get(),
        };

        let items = self.transactions.search(&query).await?;
        tracing::debug!(
            user_id = %user.id,
            found = items.len(),
            per_page = params.per_page.get(),
            "transaction search"
        );

        Ok(CursorPage::new(items, params.per_page, |tx| tx.id))
    }

    /// Returns the magnitude of the summed values per investment category.
    ///
    /// Only the user's own transactions are aggregated. Categories without
    /// transactions report zero.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `Store`.
    pub async fn investments(&self, email: &str) -> Result<InvestmentSummary, LedgerError> {
        let user = self.user_by_email(email).await?;
        let sums = self
            .transactions
            .sum_by_category(user.id, &TransactionCategory::INVESTMENTS)
            .await?;

        let investments = TransactionCategory::INVESTMENTS
            .into_iter()
            .map(|category| {
                let sum = sums.get(&category).copied().unwrap_or_default();
                (category, to_money_scale(sum.abs()))
            })
            .collect::<std::collections::BTreeMap<_, _>>();
        let total = to_money_scale(investments.values().copied().sum::<Decimal>());

        Ok(InvestmentSummary { investments, total })
    }

    async fn user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(email.to_string()))
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day_exclusive(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, start_of_day)
}
