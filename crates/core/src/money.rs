use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// An exact signed amount. Never rounded in storage; `Display` rounds to cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(Decimal);

impl Money {
    pub fn new(decimal: Decimal) -> Self {
        Money(decimal)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }
}

/// Renders `-1,234.50`: two decimals, comma thousands separators.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = format!("{:.2}", self.0.round_dp(2).abs());
        let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.0.round_dp(2).is_sign_negative() && !self.0.round_dp(2).is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{sign}{grouped}.{frac}")
    }
}

// Sums saturate at the `Decimal` range instead of panicking; any single
// cell can be as large as `Decimal::MAX`.
impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid amount: '{0}'")]
pub struct AmountError(pub String);

/// Which character separates the fraction in an amount cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// Decided per cell: a comma is the separator when it comes last and is
    /// followed by one or two digits (`-3,50`, `1.234,5`), otherwise a point.
    #[default]
    Auto,
    Point,
    Comma,
}

impl DecimalSeparator {
    fn resolve(self, body: &str) -> DecimalSeparator {
        if self != DecimalSeparator::Auto {
            return self;
        }
        match body.rfind([',', '.']) {
            Some(i) if body[i..].starts_with(',') => {
                let fraction = &body[i + 1..];
                if (1..=2).contains(&fraction.len())
                    && fraction.bytes().all(|b| b.is_ascii_digit())
                {
                    DecimalSeparator::Comma
                } else {
                    DecimalSeparator::Point
                }
            }
            _ => DecimalSeparator::Point,
        }
    }
}

impl FromStr for DecimalSeparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DecimalSeparator::Auto),
            "point" | "." => Ok(DecimalSeparator::Point),
            "comma" | "," => Ok(DecimalSeparator::Comma),
            other => Err(format!("Unknown decimal separator: '{other}'")),
        }
    }
}

/// Parses a bank-export amount: `1,234.56`, `$99.99`, `-50`, `(75.25)`,
/// `1.5e3`, `-3,50`, `1.234,56`.
pub fn parse_money(s: &str) -> Result<Money, AmountError> {
    parse_money_with(s, DecimalSeparator::Auto)
}

pub fn parse_money_with(s: &str, separator: DecimalSeparator) -> Result<Money, AmountError> {
    let trimmed = s.trim();
    let (negative, body) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };
    let body = body.replace(['$', ' '], "");
    let cleaned = match separator.resolve(&body) {
        DecimalSeparator::Comma => body.replace('.', "").replace(',', "."),
        _ => body.replace(',', ""),
    };
    if cleaned.is_empty() {
        return Err(AmountError(s.to_string()));
    }

    let dec = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| AmountError(s.to_string()))?;

    Ok(Money(if negative { -dec } else { dec }))
}

/// A transaction amount as it arrived from the source: a number, or raw text
/// that did not parse as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Value(Money),
    Raw(String),
}

impl Amount {
    /// Best-effort parse; anything non-numeric is kept verbatim.
    pub fn parse(s: &str) -> Self {
        Self::parse_with(s, DecimalSeparator::Auto)
    }

    pub fn parse_with(s: &str, separator: DecimalSeparator) -> Self {
        match parse_money_with(s, separator) {
            Ok(money) => Amount::Value(money),
            Err(_) => Amount::Raw(s.to_string()),
        }
    }

    pub fn value(&self) -> Option<Money> {
        match self {
            Amount::Value(money) => Some(*money),
            Amount::Raw(_) => None,
        }
    }

    /// Numeric coercion used by every filter and aggregate: non-numeric is zero.
    pub fn coerced(&self) -> Money {
        self.value().unwrap_or_default()
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Value(Money::zero())
    }
}

impl From<Money> for Amount {
    fn from(money: Money) -> Self {
        Amount::Value(money)
    }
}

/// Full-precision form used for export, e.g. `-42.10`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Value(money) => write!(f, "{}", money.as_decimal()),
            Amount::Raw(raw) => write!(f, "{raw}"),
        }
    }
}
