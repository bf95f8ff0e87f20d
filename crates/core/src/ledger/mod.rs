//! Transaction ledger and the running balance.
//!
//! This module implements:
//! - Category sign policy
//! - Balance arithmetic for create, edit and delete
//! - Domain types and errors
//! - Ledger service with optimistic-concurrency retries

pub mod balance;
pub mod category;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::BalanceChange;
pub use category::{SignClass, TransactionCategory, UnknownCategory, sign_for};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    BalanceCommit, CreateTransactionInput, LedgerReceipt, NewUser, Transaction, TransactionWrite,
    User,
};
