//! Money amounts with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and transaction values are `rust_decimal::Decimal` with two
//! decimal places (currency minor units).

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places stored for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount or balance a `NUMERIC(14, 2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Errors produced when parsing or validating an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),

    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,

    /// The amount has more than two decimal places.
    #[error("amount must have at most two decimal places")]
    TooManyDecimals,

    /// The amount, or the balance it produces, exceeds [`MAX_AMOUNT`].
    #[error("amount exceeds the maximum of 999999999999.99")]
    TooLarge,
}

impl MoneyError {
    /// Returns the pt-BR message shown next to the amount field.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "O valor da transação é obrigatório",
            Self::NotPositive => "A transação deve ser de no mínimo 1 centavo (0.01)",
            Self::TooManyDecimals => "O valor deve ter no máximo duas casas decimais",
            Self::TooLarge => "O valor máximo permitido é 999999999999.99",
        }
    }
}

/// Validates a positive amount and pins it to two decimal places.
///
/// Trailing zeros beyond the second place are accepted (`1.500` is `1.50`).
///
/// # Errors
///
/// Returns `MoneyError::NotPositive` for amounts `<= 0` and
/// `MoneyError::TooManyDecimals` when cents would have to be rounded and
/// `MoneyError::TooLarge` above [`MAX_AMOUNT`].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount <= Decimal::ZERO {
        return Err(MoneyError::NotPositive);
    }
    if amount > MAX_AMOUNT {
        return Err(MoneyError::TooLarge);
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(MoneyError::TooManyDecimals);
    }
    Ok(to_money_scale(amount))
}

/// Parses and validates a textual amount such as `"60"` or `"60.25"`.
///
/// # Errors
///
/// Returns `MoneyError::Invalid` if the text is not a number, otherwise the
/// errors of [`validate_amount`].
pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyError> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(trimmed.to_string()))?;
    validate_amount(amount)
}

/// Rescales an amount to exactly two decimal places.
#[must_use]
pub fn to_money_scale(amount: Decimal) -> Decimal {
    let mut scaled = amount.round_dp(MONEY_SCALE);
    scaled.rescale(MONEY_SCALE);
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("60", dec!(60.00))]
    #[case("0.01", dec!(0.01))]
    #[case(" 20.5 ", dec!(20.50))]
    #[case("1.500", dec!(1.50))]
    #[case("999999999999.99", MAX_AMOUNT)]
    fn test_parse_amount_valid(#[case] raw: &str, #[case] expected: Decimal) {
        let amount = parse_amount(raw).unwrap();
        assert_eq!(amount, expected);
        assert_eq!(amount.scale(), MONEY_SCALE);
    }

    #[rstest]
    #[case("", MoneyError::Invalid(String::new()))]
    #[case("abc", MoneyError::Invalid("abc".into()))]
    #[case("0", MoneyError::NotPositive)]
    #[case("-5", MoneyError::NotPositive)]
    #[case("0.001", MoneyError::TooManyDecimals)]
    #[case("10.999", MoneyError::TooManyDecimals)]
    #[case("1000000000000", MoneyError::TooLarge)]
    #[case("79228162514264337593543950335", MoneyError::TooLarge)]
    fn test_parse_amount_invalid(#[case] raw: &str, #[case] expected: MoneyError) {
        assert_eq!(parse_amount(raw).unwrap_err(), expected);
    }

    #[test]
    fn test_max_amount_matches_column() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
        assert_eq!(MAX_AMOUNT.scale(), MONEY_SCALE);
    }

    #[test]
    fn test_to_money_scale_pads() {
        assert_eq!(to_money_scale(dec!(7)).to_string(), "7.00");
        assert_eq!(to_money_scale(dec!(-60)).to_string(), "-60.00");
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        for err in [
            MoneyError::Invalid("x".into()),
            MoneyError::NotPositive,
            MoneyError::TooManyDecimals,
            MoneyError::TooLarge,
        ] {
            assert!(!err.user_message().is_empty());
        }
    }
}
