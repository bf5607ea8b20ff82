//! Prices in integer cents.
//!
//! The commerce API exchanges every amount as an integer number of cents
//! (`1200` is R$ 12,00). Decimal conversion is only for display.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero, i.e. free.
    pub const ZERO: Self = Self(0);

    /// Create a price from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }

    /// Amount in the currency's standard unit.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Format for display in a given currency, e.g. `R$ 12,00`.
    #[must_use]
    pub fn display(self, currency: CurrencyCode) -> String {
        let amount = format!("{:.2}", self.to_decimal());
        match currency {
            CurrencyCode::BRL => format!("R$ {}", amount.replace('.', ",")),
            CurrencyCode::USD => format!("${amount}"),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(CurrencyCode::default()))
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// ISO 4217 currency codes the store sells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_brl() {
        assert_eq!(Price::from_cents(1200).to_string(), "R$ 12,00");
        assert_eq!(Price::from_cents(5).to_string(), "R$ 0,05");
    }

    #[test]
    fn test_display_usd() {
        assert_eq!(Price::from_cents(1999).display(CurrencyCode::USD), "$19.99");
    }

    #[test]
    fn test_is_free_and_ordering() {
        assert!(Price::ZERO.is_free());
        assert!(Price::from_cents(0) < Price::from_cents(1200));
        assert_eq!(
            Price::from_cents(100) + Price::from_cents(250),
            Price::from_cents(350)
        );
    }
}
