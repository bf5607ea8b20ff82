//! Brazilian postal code (CEP).

use core::fmt;

use serde::{Deserialize, Serialize};

use super::mask::{apply_mask, digits_only};

const CEP_MASK: &str = "00000-000";
const CEP_LEN: usize = 8;

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input has no digits.
    #[error("postal code cannot be empty")]
    Empty,
    /// Not exactly eight digits.
    #[error("postal code must have 8 digits, got {0}")]
    InvalidLength(usize),
}

/// An eight-digit CEP, stored unmasked.
///
/// ```
/// use vitrine_core::PostalCode;
///
/// let cep = PostalCode::parse("29100-000").unwrap();
/// assert_eq!(cep.digits(), "29100000");
/// assert_eq!(cep.masked(), "29100-000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a masked or bare CEP.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input has exactly eight digits.
    pub fn parse(input: &str) -> Result<Self, PostalCodeError> {
        let digits = digits_only(input);
        match digits.len() {
            0 => Err(PostalCodeError::Empty),
            CEP_LEN => Ok(Self(digits)),
            n => Err(PostalCodeError::InvalidLength(n)),
        }
    }

    /// Unmasked digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Display form `00000-000`.
    #[must_use]
    pub fn masked(&self) -> String {
        apply_mask(&self.0, CEP_MASK)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl std::str::FromStr for PostalCode {
    type Err = PostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(cep: PostalCode) -> Self {
        cep.0
    }
}
