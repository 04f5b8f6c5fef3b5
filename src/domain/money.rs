use std::fmt;

use super::errors::DomainError;

/// An amount in the minor currency unit (cents).
///
/// Arithmetic is checked; overflow surfaces as [`DomainError::Internal`]
/// rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn checked_mul_quantity(self, quantity: i32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::Internal(format!("price overflow: {} x {}", self.0, quantity)))
    }

    pub fn checked_add(self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::Internal(format!("total overflow: {} + {}", self.0, other.0)))
    }
}

/// Two-decimal representation, e.g. `1999` -> `19.99`, `0` -> `0.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Sums with overflow checking.
pub fn checked_sum<I>(amounts: I) -> Result<Money, DomainError>
where
    I: IntoIterator<Item = Money>,
{
    amounts
        .into_iter()
        .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
}
