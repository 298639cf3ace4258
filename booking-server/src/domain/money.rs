//! Exact monetary amounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid monetary amount {input:?}: {reason}")]
pub struct InvalidMoney {
    input: String,
    reason: &'static str,
}

/// A non-negative amount held in minor units (cents).
///
/// Carrier charges arrive as decimal strings such as `"12.3"` or `"104.05"`;
/// booking callers may send plain JSON numbers such as `20.5`. Both are held
/// as integer cents. Always serializes as a string.
///
/// # Examples
///
/// ```
/// use booking_server::domain::Money;
///
/// let m = Money::parse("12.3").unwrap();
/// assert_eq!(m.cents(), 1230);
/// assert_eq!(m.to_string(), "12.30");
///
/// assert!(Money::parse("-1.00").is_err());
/// assert!(Money::parse("1.005").is_err());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "String")]
pub struct Money(i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Number(f64),
    Text(String),
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create an amount from a cent count.
    pub fn from_cents(cents: i64) -> Result<Self, InvalidMoney> {
        if cents < 0 {
            return Err(InvalidMoney {
                input: cents.to_string(),
                reason: "must not be negative",
            });
        }
        Ok(Money(cents))
    }

    /// Parse a decimal string with at most two fractional digits.
    pub fn parse(s: &str) -> Result<Self, InvalidMoney> {
        let err = |reason| InvalidMoney {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(err("empty"));
        }
        if trimmed.starts_with('-') {
            return Err(err("must not be negative"));
        }

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(err("no digits"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err("must be a decimal number"));
        }
        if frac.len() > 2 {
            return Err(err("more than two decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err("too large"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| err("bad fraction"))?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Money)
            .ok_or_else(|| err("too large"))
    }

    /// Convert a JSON number. Sub-cent digits are rejected, not rounded away.
    pub fn from_f64(value: f64) -> Result<Self, InvalidMoney> {
        let err = |reason| InvalidMoney {
            input: value.to_string(),
            reason,
        };

        if !value.is_finite() {
            return Err(err("must be a decimal number"));
        }
        if value < 0.0 {
            return Err(err("must not be negative"));
        }

        let scaled = value * 100.0;
        let cents = scaled.round();
        if (scaled - cents).abs() > 1e-6 {
            return Err(err("more than two decimal places"));
        }
        if cents >= i64::MAX as f64 {
            return Err(err("too large"));
        }
        Ok(Money(cents as i64))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Money({self})")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl TryFrom<MoneyRepr> for Money {
    type Error = InvalidMoney;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        match repr {
            MoneyRepr::Number(n) => Money::from_f64(n),
            MoneyRepr::Text(s) => Money::parse(&s),
        }
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}
