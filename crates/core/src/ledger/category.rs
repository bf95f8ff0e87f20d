//! Transaction categories and the sign policy.
//!
//! Every category belongs to exactly one sign class. The stored value of a
//! transaction carries that sign, so a balance update is always a plain
//! addition of the stored value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction a category moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignClass {
    /// Increases the balance (stored value >= 0).
    Additive,
    /// Decreases the balance (stored value <= 0).
    Subtractive,
}

impl SignClass {
    /// Returns `+1` or `-1`.
    #[must_use]
    pub const fn sign(self) -> Decimal {
        match self {
            Self::Additive => Decimal::ONE,
            Self::Subtractive => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Transaction category.
///
/// Serialized as a snake_case code. Deserialization also accepts the pt-BR
/// display label used by older mobile clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Cash deposit.
    #[serde(alias = "Depósito")]
    Deposit,
    /// Salary or other income.
    #[serde(alias = "Renda")]
    Income,
    /// Cash withdrawal.
    #[serde(alias = "Saque")]
    Withdrawal,
    /// Outgoing transfer.
    #[serde(alias = "Transferência")]
    Transfer,
    /// Investment fund purchase.
    #[serde(alias = "Investimento em fundos")]
    FundInvestment,
    /// Treasury bond purchase.
    #[serde(alias = "Investimento em Tesouro Direto")]
    TreasuryInvestment,
    /// Private retirement plan contribution.
    #[serde(alias = "Investimento em Previdência Privada")]
    RetirementInvestment,
    /// Stock purchase.
    #[serde(alias = "Investimento em Bolsa de Valores")]
    StockInvestment,
    /// Investment yield paid out.
    #[serde(alias = "Rendimentos de Investimentos")]
    InterestIncome,
}

/// Returned when a string names no category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction category: {0}")]
pub struct UnknownCategory(pub String);

impl TransactionCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 9] = [
        Self::Deposit,
        Self::Income,
        Self::Withdrawal,
        Self::Transfer,
        Self::FundInvestment,
        Self::TreasuryInvestment,
        Self::RetirementInvestment,
        Self::StockInvestment,
        Self::InterestIncome,
    ];

    /// Categories reported by the investments breakdown.
    pub const INVESTMENTS: [Self; 5] = [
        Self::FundInvestment,
        Self::TreasuryInvestment,
        Self::RetirementInvestment,
        Self::StockInvestment,
        Self::InterestIncome,
    ];

    /// Returns the sign class of this category.
    #[must_use]
    pub const fn sign_class(self) -> SignClass {
        match self {
            Self::Deposit | Self::Income | Self::InterestIncome => SignClass::Additive,
            Self::Withdrawal
            | Self::Transfer
            | Self::FundInvestment
            | Self::TreasuryInvestment
            | Self::RetirementInvestment
            | Self::StockInvestment => SignClass::Subtractive,
        }
    }

    /// Returns `+1` for additive categories and `-1` for subtractive ones.
    #[must_use]
    pub const fn sign(self) -> Decimal {
        self.sign_class().sign()
    }

    /// Returns true if the category shows up in the investments breakdown.
    #[must_use]
    pub const fn is_investment(self) -> bool {
        matches!(
            self,
            Self::FundInvestment
                | Self::TreasuryInvestment
                | Self::RetirementInvestment
                | Self::StockInvestment
                | Self::InterestIncome
        )
    }

    /// Stable snake_case code used on the wire and in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Income => "income",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::FundInvestment => "fund_investment",
            Self::TreasuryInvestment => "treasury_investment",
            Self::RetirementInvestment => "retirement_investment",
            Self::StockInvestment => "stock_investment",
            Self::InterestIncome => "interest_income",
        }
    }

    /// pt-BR display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Deposit => "Depósito",
            Self::Income => "Renda",
            Self::Withdrawal => "Saque",
            Self::Transfer => "Transferência",
            Self::FundInvestment => "Investimento em fundos",
            Self::TreasuryInvestment => "Investimento em Tesouro Direto",
            Self::RetirementInvestment => "Investimento em Previdência Privada",
            Self::StockInvestment => "Investimento em Bolsa de Valores",
            Self::InterestIncome => "Rendimentos de Investimentos",
        }
    }
}

/// Sign applied to a positive amount entered for `category`.
#[must_use]
pub const fn sign_for(category: TransactionCategory) -> Decimal {
    category.sign()
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TransactionCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(trimmed) || c.label() == trimmed)
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransactionCategory::Deposit)]
    #[case(TransactionCategory::Income)]
    #[case(TransactionCategory::InterestIncome)]
    fn test_additive_categories_have_positive_sign(#[case] category: TransactionCategory) {
        assert_eq!(category.sign_class(), SignClass::Additive);
        assert_eq!(sign_for(category), Decimal::ONE);
    }

    #[rstest]
    #[case(TransactionCategory::Withdrawal)]
    #[case(TransactionCategory::Transfer)]
    #[case(TransactionCategory::FundInvestment)]
    #[case(TransactionCategory::TreasuryInvestment)]
    #[case(TransactionCategory::RetirementInvestment)]
    #[case(TransactionCategory::StockInvestment)]
    fn test_subtractive_categories_have_negative_sign(#[case] category: TransactionCategory) {
        assert_eq!(category.sign_class(), SignClass::Subtractive);
        assert_eq!(sign_for(category), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_sign_classes_partition_all_categories() {
        let additive = TransactionCategory::ALL
            .iter()
            .filter(|c| c.sign_class() == SignClass::Additive)
            .count();
        let subtractive = TransactionCategory::ALL
            .iter()
            .filter(|c| c.sign_class() == SignClass::Subtractive)
            .count();

        assert_eq!(additive, 3);
        assert_eq!(subtractive, 6);
        assert_eq!(additive + subtractive, TransactionCategory::ALL.len());
    }

    #[test]
    fn test_investments_are_the_four_purchases_plus_interest() {
        for category in TransactionCategory::ALL {
            assert_eq!(
                category.is_investment(),
                TransactionCategory::INVESTMENTS.contains(&category)
            );
        }
    }

    #[test]
    fn test_from_str_accepts_code_and_label() {
        for category in TransactionCategory::ALL {
            assert_eq!(category.code().parse::<TransactionCategory>().unwrap(), category);
            assert_eq!(category.label().parse::<TransactionCategory>().unwrap(), category);
        }
        assert_eq!(
            "WITHDRAWAL".parse::<TransactionCategory>().unwrap(),
            TransactionCategory::Withdrawal
        );
        assert!("lottery".parse::<TransactionCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_code_and_accepts_label() {
        let json = serde_json::to_string(&TransactionCategory::TreasuryInvestment).unwrap();
        assert_eq!(json, "\"treasury_investment\"");

        let parsed: TransactionCategory = serde_json::from_str("\"Saque\"").unwrap();
        assert_eq!(parsed, TransactionCategory::Withdrawal);
    }
}
