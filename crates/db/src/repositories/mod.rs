//! Repository implementations of the core store traits.
//!
//! Repositories hide the `SeaORM` details from the rest of the application.

pub mod transaction;
pub mod user;

pub use transaction::TransactionRepository;
pub use user::UserRepository;

use carteira_core::store::StoreError;
use sea_orm::{DbErr, SqlErr};

/// Maps a database error to a store error, keeping unique violations apart.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Duplicate(detail),
        _ => StoreError::Backend(err.to_string()),
    }
}
