//! Phone numbers split into country, area and local parts.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::mask::digits_only;

/// Country code assumed when the input has none.
pub const DEFAULT_COUNTRY_CODE: &str = "55";

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input has no digits.
    #[error("phone cannot be empty")]
    Empty,
    /// Area code is not two digits.
    #[error("area code must have 2 digits, got {0}")]
    InvalidAreaCode(usize),
    /// Local number is not 8 (landline) or 9 (mobile) digits.
    #[error("phone number must have 8 or 9 digits, got {0}")]
    InvalidNumber(usize),
}

/// A phone number as the commerce API stores it.
///
/// Parsed from the masked, space-delimited form used by the panel inputs:
/// `"27 9 1234-5678"` becomes area code `27` and number `912345678`. A
/// leading `+NN` token sets the country code.
///
/// ```
/// use vitrine_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("27 9 1234-5678").unwrap();
/// assert_eq!(phone.country_code, "55");
/// assert_eq!(phone.area_code, "27");
/// assert_eq!(phone.number, "912345678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// Country calling code without `+`.
    pub country_code: String,
    /// Two-digit area code (DDD).
    pub area_code: String,
    /// Local number, digits only.
    pub number: String,
}

impl PhoneNumber {
    /// Parse a formatted phone string.
    ///
    /// With spaces, the first token (after an optional `+country` token) is
    /// the area code and the rest is the local number. Without spaces, the
    /// digits are split positionally: 10/11 digits are area + number, 12/13
    /// digits carry a leading country code.
    ///
    /// # Errors
    ///
    /// Returns an error if the parts have the wrong digit counts.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let mut tokens: Vec<&str> = input.split_whitespace().collect();
        if tokens.is_empty() || digits_only(input).is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut country_code = DEFAULT_COUNTRY_CODE.to_string();
        if tokens.first().is_some_and(|t| t.starts_with('+')) {
            let token = tokens.remove(0);
            country_code = digits_only(token);
        }

        let (area_code, number) = if tokens.len() > 1 {
            let area = tokens.first().map(|t| digits_only(t)).unwrap_or_default();
            let number = digits_only(&tokens.get(1..).unwrap_or_default().concat());
            (area, number)
        } else {
            let digits = digits_only(&tokens.concat());
            let digits = match digits.len() {
                12 | 13 => {
                    let (country, rest) = digits.split_at(2);
                    country_code = country.to_string();
                    rest.to_string()
                }
                _ => digits,
            };
            if digits.len() < 2 {
                return Err(PhoneError::InvalidAreaCode(digits.len()));
            }
            let (area, number) = digits.split_at(2);
            (area.to_string(), number.to_string())
        };

        if area_code.len() != 2 {
            return Err(PhoneError::InvalidAreaCode(area_code.len()));
        }
        if !(8..=9).contains(&number.len()) {
            return Err(PhoneError::InvalidNumber(number.len()));
        }

        Ok(Self {
            country_code,
            area_code,
            number,
        })
    }

    /// Whether the local number is a mobile number (nine digits).
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.number.len() == 9
    }

    /// Panel display form, e.g. `27 9 1234-5678`.
    #[must_use]
    pub fn masked(&self) -> String {
        let (head, tail) = self.number.split_at(self.number.len().saturating_sub(4));
        if self.is_mobile() {
            let (nine, rest) = head.split_at(1);
            format!("{} {nine} {rest}-{tail}", self.area_code)
        } else {
            format!("{} {head}-{tail}", self.area_code)
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} {}", self.country_code, self.masked())
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_delimited_mobile() {
        let phone = PhoneNumber::parse("27 9 1234-5678").unwrap();
        assert_eq!(phone.area_code, "27");
        assert_eq!(phone.number, "912345678");
        assert_eq!(phone.country_code, "55");
        assert!(phone.is_mobile());
    }

    #[test]
    fn test_parse_with_country_token() {
        let phone = PhoneNumber::parse("+1 27 3333-4444").unwrap();
        assert_eq!(phone.country_code, "1");
        assert_eq!(phone.area_code, "27");
        assert_eq!(phone.number, "33334444");
        assert!(!phone.is_mobile());
    }

    #[test]
    fn test_parse_unspaced_digits() {
        let phone = PhoneNumber::parse("(27)91234-5678").unwrap();
        assert_eq!(phone.area_code, "27");
        assert_eq!(phone.number, "912345678");

        let phone = PhoneNumber::parse("5527912345678").unwrap();
        assert_eq!(phone.country_code, "55");
        assert_eq!(phone.area_code, "27");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PhoneNumber::parse("  "), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("279 1234-5678"),
            Err(PhoneError::InvalidAreaCode(3))
        );
        assert_eq!(
            PhoneNumber::parse("27 1234-567"),
            Err(PhoneError::InvalidNumber(7))
        );
    }

    #[test]
    fn test_masked_round_trip() {
        let phone = PhoneNumber::parse("27 9 1234-5678").unwrap();
        assert_eq!(phone.masked(), "27 9 1234-5678");
        assert_eq!(PhoneNumber::parse(&phone.masked()).unwrap(), phone);

        let landline = PhoneNumber::parse("27 3333-4444").unwrap();
        assert_eq!(landline.masked(), "27 3333-4444");
        assert_eq!(landline.to_string(), "+55 27 3333-4444");
    }
}
