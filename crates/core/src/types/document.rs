//! Brazilian tax documents (CPF and CNPJ).

use core::fmt;

use serde::{Deserialize, Serialize};

use super::mask::{apply_mask, digits_only};

const CPF_MASK: &str = "000.000.000-00";
const CNPJ_MASK: &str = "00.000.000/0000-00";
const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Errors that can occur when parsing a [`Document`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The input has no digits.
    #[error("document cannot be empty")]
    Empty,
    /// The digit count matches neither CPF (11) nor CNPJ (14).
    #[error("document must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    InvalidLength(usize),
    /// All digits are the same (e.g. `000.000.000-00`), which passes the
    /// checksum but is never issued.
    #[error("document cannot be a repeated digit sequence")]
    RepeatedDigits,
    /// Check digits do not match.
    #[error("invalid {0} check digits")]
    InvalidCheckDigits(DocumentKind),
}

/// Which kind of document a [`Document`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Individual taxpayer registry (11 digits).
    Cpf,
    /// Company registry (14 digits).
    Cnpj,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpf => write!(f, "CPF"),
            Self::Cnpj => write!(f, "CNPJ"),
        }
    }
}

/// A validated CPF or CNPJ, stored as bare digits.
///
/// Serializes as the unmasked digit string, which is what the commerce API
/// expects.
///
/// ```
/// use vitrine_core::{Document, DocumentKind};
///
/// let cpf = Document::parse("529.982.247-25").unwrap();
/// assert_eq!(cpf.kind(), DocumentKind::Cpf);
/// assert_eq!(cpf.digits(), "52998224725");
/// assert_eq!(cpf.masked(), "529.982.247-25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Document {
    kind: DocumentKind,
    digits: String,
}

impl Document {
    /// Parse a document from masked or bare input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has the wrong digit count, is a repeated
    /// digit sequence, or fails the check-digit verification.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let digits = digits_only(input);
        let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();

        let kind = match values.len() {
            0 => return Err(DocumentError::Empty),
            CPF_LEN => DocumentKind::Cpf,
            CNPJ_LEN => DocumentKind::Cnpj,
            n => return Err(DocumentError::InvalidLength(n)),
        };

        if values.windows(2).all(|w| w.first() == w.last()) {
            return Err(DocumentError::RepeatedDigits);
        }

        let valid = match kind {
            DocumentKind::Cpf => cpf_check_digits_match(&values),
            DocumentKind::Cnpj => cnpj_check_digits_match(&values),
        };
        if !valid {
            return Err(DocumentError::InvalidCheckDigits(kind));
        }

        Ok(Self { kind, digits })
    }

    /// Document kind.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Unmasked digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Digits formatted with the CPF or CNPJ mask.
    #[must_use]
    pub fn masked(&self) -> String {
        match self.kind {
            DocumentKind::Cpf => apply_mask(&self.digits, CPF_MASK),
            DocumentKind::Cnpj => apply_mask(&self.digits, CNPJ_MASK),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl std::str::FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Document {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Document> for String {
    fn from(doc: Document) -> Self {
        doc.digits
    }
}

/// Weighted check digit: `sum * 10 mod 11`, with 10 mapped to 0.
fn cpf_digit(values: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = values
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(v, w)| v * w)
        .sum();
    (sum * 10 % 11) % 10
}

fn cpf_check_digits_match(values: &[u32]) -> bool {
    let (Some(body), Some(tail)) = (values.get(..9), values.get(9..)) else {
        return false;
    };
    let first = cpf_digit(body, 10);
    let Some(with_first) = values.get(..10) else {
        return false;
    };
    let second = cpf_digit(with_first, 11);
    tail == [first, second]
}

/// CNPJ check digit: `sum mod 11`, below 2 maps to 0, otherwise `11 - r`.
fn cnpj_digit(values: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    let r = sum % 11;
    if r < 2 { 0 } else { 11 - r }
}

fn cnpj_check_digits_match(values: &[u32]) -> bool {
    let (Some(body), Some(with_first), Some(tail)) =
        (values.get(..12), values.get(..13), values.get(12..))
    else {
        return false;
    };
    let first = cnpj_digit(body, &CNPJ_FIRST_WEIGHTS);
    let second = cnpj_digit(with_first, &CNPJ_SECOND_WEIGHTS);
    tail == [first, second]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_cpf() {
        let doc = Document::parse("52998224725").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cpf);
        assert_eq!(doc.masked(), "529.982.247-25");
    }

    #[test]
    fn test_parse_valid_cnpj() {
        let doc = Document::parse("11.222.333/0001-81").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cnpj);
        assert_eq!(doc.digits(), "11222333000181");
    }

    #[test]
    fn test_mask_then_unmask_reproduces_digits() {
        for digits in ["52998224725", "11222333000181", "12345678909"] {
            let doc = Document::parse(digits).unwrap();
            let remasked = Document::parse(&doc.masked()).unwrap();
            assert_eq!(remasked.digits(), digits);
            assert_eq!(digits_only(&doc.masked()), digits);
        }
    }

    #[test]
    fn test_parse_wrong_check_digits() {
        assert_eq!(
            Document::parse("529.982.247-26"),
            Err(DocumentError::InvalidCheckDigits(DocumentKind::Cpf))
        );
        assert_eq!(
            Document::parse("11.222.333/0001-82"),
            Err(DocumentError::InvalidCheckDigits(DocumentKind::Cnpj))
        );
    }

    #[test]
    fn test_parse_repeated_digits() {
        assert_eq!(
            Document::parse("111.111.111-11"),
            Err(DocumentError::RepeatedDigits)
        );
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(Document::parse(""), Err(DocumentError::Empty));
        assert_eq!(Document::parse("123"), Err(DocumentError::InvalidLength(3)));
    }

    #[test]
    fn test_serde_uses_digits() {
        let doc = Document::parse("529.982.247-25").unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, "\"52998224725\"");

        let parsed: Document = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(parsed, doc);
        assert!(serde_json::from_str::<Document>("\"00000000000\"").is_err());
    }
}
