//! Balance arithmetic.
//!
//! Every balance change in the engine goes through [`signed_delta`] and
//! [`apply_delta`]; nothing else is allowed to derive a sign from a category.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// How a category moves the balance of the bank a transaction is posted to.
///
/// Stored as `add` / `subtract`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculateMethod {
    /// The amount is added to the balance.
    #[serde(rename = "add")]
    Credit,
    /// The amount is subtracted from the balance.
    #[serde(rename = "subtract")]
    Debit,
}

impl CalculateMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "add",
            Self::Debit => "subtract",
        }
    }
}

impl TryFrom<&str> for CalculateMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "add" | "credit" => Ok(Self::Credit),
            "subtract" | "debit" => Ok(Self::Debit),
            other => Err(EngineError::Validation(format!(
                "invalid calculate method: {other}"
            ))),
        }
    }
}

/// Reporting class of a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid category type: {other}"
            ))),
        }
    }
}

/// Balance effect of a stored (positive) amount under `method`.
pub fn signed_delta(amount: Money, method: CalculateMethod) -> Money {
    match method {
        CalculateMethod::Credit => amount,
        CalculateMethod::Debit => -amount,
    }
}

/// Applies `delta` to `balance`, rejecting a negative or overflowing result.
///
/// `bank` only labels the error.
pub fn apply_delta(balance: Money, delta: Money, bank: &str) -> ResultEngine<Money> {
    let next = balance
        .checked_add(delta)
        .ok_or_else(|| EngineError::Validation(format!("balance overflow on bank {bank}")))?;
    if next.is_negative() {
        return Err(EngineError::InsufficientFunds(format!(
            "bank {bank} has {balance}, cannot apply {delta}"
        )));
    }
    Ok(next)
}

/// Validates a transaction amount: amounts are positive magnitudes.
pub(crate) fn ensure_positive_amount(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::Validation("amount must be > 0".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_adds_debit_subtracts() {
        assert_eq!(
            signed_delta(Money::new(200), CalculateMethod::Credit),
            Money::new(200)
        );
        assert_eq!(
            signed_delta(Money::new(30), CalculateMethod::Debit),
            Money::new(-30)
        );
    }

    #[test]
    fn apply_then_reverse_restores_balance() {
        for method in [CalculateMethod::Credit, CalculateMethod::Debit] {
            for amount in [1, 30, 9_999, 1_000_000] {
                let start = Money::new(1_000_000);
                let delta = signed_delta(Money::new(amount), method);
                let applied = apply_delta(start, delta, "main").unwrap();
                let reversed = apply_delta(applied, -delta, "main").unwrap();
                assert_eq!(reversed, start);
            }
        }
    }

    #[test]
    fn apply_rejects_negative_result() {
        let err = apply_delta(Money::new(70), Money::new(-100), "main").unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds(_)));
    }

    #[test]
    fn apply_allows_exactly_zero() {
        assert_eq!(
            apply_delta(Money::new(70), Money::new(-70), "main").unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn method_round_trips_storage_names() {
        assert_eq!(CalculateMethod::try_from("add").unwrap(), CalculateMethod::Credit);
        assert_eq!(
            CalculateMethod::try_from("subtract").unwrap(),
            CalculateMethod::Debit
        );
        assert_eq!(CalculateMethod::Debit.as_str(), "subtract");
        assert!(CalculateMethod::try_from("multiply").is_err());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(ensure_positive_amount(Money::new(0)).is_err());
        assert!(ensure_positive_amount(Money::new(-5)).is_err());
        assert!(ensure_positive_amount(Money::new(5)).is_ok());
    }
}
