use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Every amount in a trace carries its currency explicitly. Two amounts in
/// different currencies are never combined; there is no implicit conversion.
///
/// # Examples
///
/// ```
/// use libr_trace::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let eur = CurrencyCode::new("EUR");
/// assert_ne!(usd, eur);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        left: CurrencyCode,
        right: CurrencyCode,
    },
}

/// A fixed-point amount tagged with its currency.
///
/// Amounts are signed: deposits are positive, withdrawals negative.
/// Balances use the same type.
///
/// # Examples
///
/// ```
/// use libr_trace::core::currency::Money;
/// use rust_decimal_macros::dec;
///
/// let a = Money::new(dec!(100.25), "USD");
/// let b = Money::new(dec!(-40.25), "USD");
/// assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(60.00));
///
/// let c = Money::new(dec!(1), "EUR");
/// assert!(a.checked_add(&c).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<CurrencyCode>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Fails unless `other` is in the same currency.
    pub fn ensure_same_currency(&self, other: &CurrencyCode) -> Result<(), MoneyError> {
        if &self.currency != other {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other.currency)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other.currency)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_equality() {
        let a = CurrencyCode::new("USD");
        let b = CurrencyCode::new("USD");
        assert_eq!(a, b);
    }

    #[test]
    fn test_money_add_same_currency() {
        let a = Money::new(dec!(10.10), "USD");
        let b = Money::new(dec!(0.20), "USD");
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.amount(), dec!(10.30));
        assert_eq!(sum.currency().as_str(), "USD");
    }

    #[test]
    fn test_money_sub_goes_negative() {
        let a = Money::new(dec!(5), "USD");
        let b = Money::new(dec!(7.5), "USD");
        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff.amount(), dec!(-2.5));
        assert!(diff.is_negative());
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::new(dec!(5), "USD");
        let b = Money::new(dec!(5), "GBP");
        let err = a.checked_add(&b).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                left: CurrencyCode::new("USD"),
                right: CurrencyCode::new("GBP"),
            }
        );
    }

    #[test]
    fn test_money_display() {
        let m = Money::new(dec!(1234.50), "USD");
        assert_eq!(format!("{}", m), "1234.50 USD");
    }
}
