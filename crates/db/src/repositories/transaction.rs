//! Transaction repository for database operations.
//!
//! Balance writes are a compare-and-swap on `users.version`, executed in the
//! same database transaction as the record write they belong to.

use std::collections::BTreeMap;

use carteira_core::ledger::category::TransactionCategory;
use carteira_core::ledger::types::{BalanceCommit, Transaction, TransactionWrite, User};
use carteira_core::store::{
    StoreError, TransactionQuery, TransactionRepository as TransactionRepoTrait,
};
use carteira_shared::types::{TransactionId, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::store_error;
use super::user::to_domain as user_to_domain;
use crate::entities::{
    sea_orm_active_enums::TransactionCategory as DbCategory, transactions, users,
};

/// Transaction repository backed by Postgres.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct CategorySum {
    category: DbCategory,
    total: Option<Decimal>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Applies the record write inside `txn`.
    async fn apply_write(
        txn: &DatabaseTransaction,
        user_id: UserId,
        write: TransactionWrite,
    ) -> Result<(), StoreError> {
        match write {
            TransactionWrite::Insert(tx) => {
                transactions::ActiveModel {
                    id: Set(tx.id.into_inner()),
                    user_id: Set(tx.user_id.into_inner()),
                    category: Set(to_db_category(tx.category)),
                    value: Set(tx.value),
                    file: Set(tx.file),
                    created_at: Set(tx.created_at.fixed_offset()),
                }
                .insert(txn)
                .await
                .map_err(store_error)?;
            }
            TransactionWrite::UpdateValue { id, value } => {
                let result = transactions::Entity::update_many()
                    .col_expr(transactions::Column::Value, Expr::value(value))
                    .filter(transactions::Column::Id.eq(id.into_inner()))
                    .filter(transactions::Column::UserId.eq(user_id.into_inner()))
                    .exec(txn)
                    .await
                    .map_err(store_error)?;
                if result.rows_affected == 0 {
                    return Err(StoreError::MissingTransaction(id));
                }
            }
            TransactionWrite::Delete(id) => {
                let result = transactions::Entity::delete_many()
                    .filter(transactions::Column::Id.eq(id.into_inner()))
                    .filter(transactions::Column::UserId.eq(user_id.into_inner()))
                    .exec(txn)
                    .await
                    .map_err(store_error)?;
                if result.rows_affected == 0 {
                    return Err(StoreError::MissingTransaction(id));
                }
            }
        }
        Ok(())
    }
}

impl TransactionRepoTrait for TransactionRepository {
    async fn find_by_id(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_error)?;

        Ok(model.map(to_domain))
    }

    async fn recent(&self, user_id: UserId, limit: u64) -> Result<Vec<Transaction>, StoreError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn search(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError> {
        let mut select = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(query.user_id.into_inner()))
            .filter(transactions::Column::CreatedAt.gte(query.from.fixed_offset()))
            .filter(transactions::Column::CreatedAt.lt(query.until.fixed_offset()));

        if let Some(category) = query.category {
            select = select.filter(transactions::Column::Category.eq(to_db_category(category)));
        }

        if let Some((created_at, id)) = query.after {
            let created_at = created_at.fixed_offset();
            select = select.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.lt(created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(created_at))
                            .add(transactions::Column::Id.lt(id.into_inner())),
                    ),
            );
        }

        let models = select
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn sum_by_category(
        &self,
        user_id: UserId,
        categories: &[TransactionCategory],
    ) -> Result<BTreeMap<TransactionCategory, Decimal>, StoreError> {
        let rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Category)
            .column_as(Expr::col(transactions::Column::Value).sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .filter(
                transactions::Column::Category
                    .is_in(categories.iter().copied().map(to_db_category)),
            )
            .group_by(transactions::Column::Category)
            .into_model::<CategorySum>()
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    from_db_category(row.category),
                    row.total.unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn commit(&self, commit: BalanceCommit) -> Result<User, StoreError> {
        let user_id = commit.user_id;
        let txn = self.db.begin().await.map_err(store_error)?;

        let swapped = users::Entity::update_many()
            .col_expr(users::Column::Balance, Expr::value(commit.new_balance))
            .col_expr(
                users::Column::Version,
                Expr::col(users::Column::Version).add(1),
            )
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(users::Column::Id.eq(user_id.into_inner()))
            .filter(users::Column::Version.eq(commit.expected_version))
            .exec(&txn)
            .await
            .map_err(store_error)?;

        if swapped.rows_affected == 0 {
            txn.rollback().await.map_err(store_error)?;
            tracing::debug!(
                user_id = %user_id,
                expected = commit.expected_version,
                "stale balance version"
            );
            return Err(StoreError::StaleVersion(user_id));
        }

        if let Err(e) = Self::apply_write(&txn, user_id, commit.write).await {
            txn.rollback().await.map_err(store_error)?;
            return Err(e);
        }

        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&txn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::Backend(format!("user {user_id} vanished mid-commit")))?;

        txn.commit().await.map_err(store_error)?;
        Ok(user_to_domain(user))
    }
}

/// Converts a database row to the domain transaction.
fn to_domain(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        category: from_db_category(model.category),
        value: model.value,
        created_at: model.created_at.to_utc(),
        user_id: UserId::from_uuid(model.user_id),
        file: model.file,
    }
}

/// Convert domain category to database enum.
fn to_db_category(category: TransactionCategory) -> DbCategory {
    match category {
        TransactionCategory::Deposit => DbCategory::Deposit,
        TransactionCategory::Income => DbCategory::Income,
        TransactionCategory::Withdrawal => DbCategory::Withdrawal,
        TransactionCategory::Transfer => DbCategory::Transfer,
        TransactionCategory::FundInvestment => DbCategory::FundInvestment,
        TransactionCategory::TreasuryInvestment => DbCategory::TreasuryInvestment,
        TransactionCategory::RetirementInvestment => DbCategory::RetirementInvestment,
        TransactionCategory::StockInvestment => DbCategory::StockInvestment,
        TransactionCategory::InterestIncome => DbCategory::InterestIncome,
    }
}

/// Convert database enum to domain category.
fn from_db_category(category: DbCategory) -> TransactionCategory {
    match category {
        DbCategory::Deposit => TransactionCategory::Deposit,
        DbCategory::Income => TransactionCategory::Income,
        DbCategory::Withdrawal => TransactionCategory::Withdrawal,
        DbCategory::Transfer => TransactionCategory::Transfer,
        DbCategory::FundInvestment => TransactionCategory::FundInvestment,
        DbCategory::TreasuryInvestment => TransactionCategory::TreasuryInvestment,
        DbCategory::RetirementInvestment => TransactionCategory::RetirementInvestment,
        DbCategory::StockInvestment => TransactionCategory::StockInvestment,
        DbCategory::InterestIncome => TransactionCategory::InterestIncome,
    }
}
