//! Statement view types.

use std::collections::BTreeMap;

use carteira_shared::auth::UserInfo;
use carteira_shared::types::{CursorPage, PerPage, TransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::category::TransactionCategory;
use crate::ledger::types::Transaction;

/// Profile plus the most recent transactions, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatement {
    /// Public profile, including the balance.
    pub user: UserInfo,
    /// Recent transactions.
    pub statement: Vec<Transaction>,
}

/// One page of history, keyed by transaction id.
pub type TransactionPage = CursorPage<Transaction, TransactionId>;

/// History search parameters.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Owner email.
    pub email: String,
    /// Last transaction of the previous page.
    pub cursor: Option<TransactionId>,
    /// First day of the range (UTC).
    pub from: NaiveDate,
    /// Last day of the range (UTC), inclusive.
    pub to: NaiveDate,
    /// Optional category filter.
    pub category: Option<TransactionCategory>,
    /// Page size.
    pub per_page: PerPage,
}

/// Investment totals per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestmentSummary {
    /// Magnitude of the summed values, for every investment category.
    pub investments: BTreeMap<TransactionCategory, Decimal>,
    /// Sum of all magnitudes.
    pub total: Decimal,
}
