//! User repository for database operations.

use carteira_core::ledger::types::{NewUser, User};
use carteira_core::store::{StoreError, UserRepository as UserRepoTrait};
use carteira_shared::types::UserId;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::store_error;
use crate::entities::users;

/// User repository backed by Postgres.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl UserRepoTrait for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(store_error)?;

        Ok(model.map(to_domain))
    }

    async fn create(&self, input: NewUser) -> Result<User, StoreError> {
        let now = Utc::now().fixed_offset();
        let user = users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            balance: Set(Decimal::new(0, 2)),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = user.insert(&self.db).await.map_err(store_error)?;
        Ok(to_domain(model))
    }
}

/// Converts a database row to the domain user.
pub(crate) fn to_domain(model: users::Model) -> User {
    User {
        id: UserId::from_uuid(model.id),
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        balance: model.balance,
        version: model.version,
        created_at: model.created_at.to_utc(),
    }
}
