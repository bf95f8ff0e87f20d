//! Read-only views over a user's ledger.
//!
//! - Recent statement (profile plus latest transactions)
//! - Filtered history with keyset pagination
//! - Investment breakdown

pub mod service;
pub mod types;


pub use service::StatementService;
pub use types::{InvestmentSummary, SearchParams, TransactionPage, UserStatement};
