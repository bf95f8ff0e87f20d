//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_category")]
pub enum TransactionCategory {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "fund_investment")]
    FundInvestment,
    #[sea_orm(string_value = "treasury_investment")]
    TreasuryInvestment,
    #[sea_orm(string_value = "retirement_investment")]
    RetirementInvestment,
    #[sea_orm(string_value = "stock_investment")]
    StockInvestment,
    #[sea_orm(string_value = "interest_income")]
    InterestIncome,
}
