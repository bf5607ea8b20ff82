//! Credit card fields.
//!
//! Only shape checks live here (Luhn, expiry, CVV length). Authorization is
//! the payment gateway's job.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::mask::digits_only;

/// Errors that can occur when parsing card fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// Card number is not 13 to 19 digits.
    #[error("card number must have 13 to 19 digits, got {0}")]
    InvalidNumberLength(usize),
    /// Card number fails the Luhn checksum.
    #[error("card number checksum is invalid")]
    InvalidChecksum,
    /// Expiry is not `MM/YY` or `MM/YYYY`.
    #[error("expiry must be MM/YY or MM/YYYY")]
    InvalidExpiryFormat,
    /// Expiry month is outside 1..=12.
    #[error("expiry month must be between 1 and 12, got {0}")]
    InvalidExpiryMonth(u32),
    /// CVV is not 3 or 4 digits.
    #[error("security code must have 3 or 4 digits, got {0}")]
    InvalidCvv(usize),
}

/// A card number that passed the length and Luhn checks.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    /// Parse a card number, ignoring spaces and dashes.
    ///
    /// # Errors
    ///
    /// Returns an error on bad length or checksum.
    pub fn parse(input: &str) -> Result<Self, CardError> {
        let digits = digits_only(input);
        if !(13..=19).contains(&digits.len()) {
            return Err(CardError::InvalidNumberLength(digits.len()));
        }
        if !luhn_valid(&digits) {
            return Err(CardError::InvalidChecksum);
        }
        Ok(Self(digits))
    }

    /// Unmasked digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Last four digits.
    #[must_use]
    pub fn last4(&self) -> &str {
        self.0.get(self.0.len().saturating_sub(4)..).unwrap_or_default()
    }
}

// Never print the full PAN.
impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber(**** {})", self.last4())
    }
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Card expiry month and four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiry {
    /// Month, 1..=12.
    pub month: u32,
    /// Four-digit year.
    pub year: i32,
}

impl CardExpiry {
    /// Parse `MM/YY` or `MM/YYYY`. Two-digit years are in the 2000s.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input or a month outside 1..=12.
    pub fn parse(input: &str) -> Result<Self, CardError> {
        let (month, year) = input
            .trim()
            .split_once('/')
            .ok_or(CardError::InvalidExpiryFormat)?;

        let month_digits = digits_only(month);
        let year_digits = digits_only(year);
        if month_digits.is_empty() || month_digits.len() > 2 {
            return Err(CardError::InvalidExpiryFormat);
        }

        let month: u32 = month_digits
            .parse()
            .map_err(|_| CardError::InvalidExpiryFormat)?;
        if !(1..=12).contains(&month) {
            return Err(CardError::InvalidExpiryMonth(month));
        }

        let year: i32 = match year_digits.len() {
            2 => 2000 + year_digits
                .parse::<i32>()
                .map_err(|_| CardError::InvalidExpiryFormat)?,
            4 => year_digits
                .parse()
                .map_err(|_| CardError::InvalidExpiryFormat)?,
            _ => return Err(CardError::InvalidExpiryFormat),
        };

        Ok(Self { month, year })
    }

    /// Whether the card is expired on `today`. A card is valid through the
    /// last day of its expiry month.
    #[must_use]
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        (self.year, self.month) < (today.year(), today.month())
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Card security code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cvv(String);

impl Cvv {
    /// Parse a 3 or 4 digit security code.
    ///
    /// # Errors
    ///
    /// Returns an error on any other digit count.
    pub fn parse(input: &str) -> Result<Self, CardError> {
        let digits = digits_only(input);
        if !(3..=4).contains(&digits.len()) {
            return Err(CardError::InvalidCvv(digits.len()));
        }
        Ok(Self(digits))
    }

    /// Unmasked digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Cvv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cvv(***)")
    }
}
