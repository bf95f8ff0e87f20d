//! Balance arithmetic for ledger mutations.
//!
//! Every mutation is planned against the balance that was read, producing a
//! [`BalanceChange`] or an insufficient-funds error. Nothing here touches a
//! store.
//!
//! - create: `balance += amount * sign`
//! - delete: `balance += -value`
//! - edit (additive): `balance += new - old`
//! - edit (subtractive): `balance -= new - old`

use carteira_shared::types::money::{MAX_AMOUNT, MoneyError, to_money_scale};
use rust_decimal::Decimal;

use super::category::{SignClass, TransactionCategory};
use super::error::LedgerError;
use super::types::Transaction;

/// A planned balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    /// Balance before the mutation.
    pub previous: Decimal,
    /// Signed change applied to the balance.
    pub delta: Decimal,
    /// Balance after the mutation.
    pub next: Decimal,
}

impl BalanceChange {
    fn apply(
        category: TransactionCategory,
        balance: Decimal,
        delta: Decimal,
    ) -> Result<Self, LedgerError> {
        let next = balance
            .checked_add(delta)
            .filter(|next| *next <= MAX_AMOUNT)
            .ok_or(MoneyError::TooLarge)?;
        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                category,
                balance,
                delta,
            });
        }
        Ok(Self {
            previous: balance,
            delta,
            next: to_money_scale(next),
        })
    }
}

/// Signed value stored for a positive `amount` of `category`.
#[must_use]
pub fn signed_value(category: TransactionCategory, amount: Decimal) -> Decimal {
    to_money_scale(amount * category.sign())
}

/// Plans the creation of a transaction worth `amount`.
///
/// Returns the change and the signed value to store.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientFunds` if the balance would go negative
/// and `LedgerError::InvalidAmount` if it would exceed [`MAX_AMOUNT`].
pub fn plan_create(
    balance: Decimal,
    category: TransactionCategory,
    amount: Decimal,
) -> Result<(BalanceChange, Decimal), LedgerError> {
    let value = signed_value(category, amount);
    let change = BalanceChange::apply(category, balance, value)?;
    Ok((change, value))
}

/// Plans the removal of `tx`, reversing its value.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientFunds` if the reversal would drive the
/// balance negative (deleting a deposit that was already spent).
pub fn plan_delete(balance: Decimal, tx: &Transaction) -> Result<BalanceChange, LedgerError> {
    BalanceChange::apply(tx.category, balance, -tx.value)
}

/// Plans changing the magnitude of `tx` to `new_magnitude`.
///
/// The category, and therefore the sign, stays the same. Returns the change
/// and the new signed value to store.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientFunds` if the balance would go negative
/// and `LedgerError::InvalidAmount` if it would exceed [`MAX_AMOUNT`].
pub fn plan_edit(
    balance: Decimal,
    tx: &Transaction,
    new_magnitude: Decimal,
) -> Result<(BalanceChange, Decimal), LedgerError> {
    let difference = new_magnitude
        .checked_sub(tx.magnitude())
        .ok_or(MoneyError::TooLarge)?;
    let delta = match tx.category.sign_class() {
        SignClass::Additive => difference,
        SignClass::Subtractive => -difference,
    };
    let change = BalanceChange::apply(tx.category, balance, delta)?;
    Ok((change, signed_value(tx.category, new_magnitude)))
}
