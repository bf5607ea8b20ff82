//! Customer email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email cannot contain spaces")]
    Whitespace,
    #[error("email must contain exactly one @")]
    InvalidAt,
    #[error("email is missing the part before @")]
    EmptyLocalPart,
    /// Domain is empty, has no dot, or starts or ends with one.
    #[error("email domain is not valid")]
    InvalidDomain,
}

/// A trimmed email address with one `@` and a dotted domain.
///
/// ```
/// use vitrine_core::Email;
///
/// let email = Email::parse("  ana@vitrine.com.br ").unwrap();
/// assert_eq!(email.as_str(), "ana@vitrine.com.br");
/// assert_eq!(email.domain(), "vitrine.com.br");
///
/// assert!(Email::parse("ana@").is_err());
/// assert!(Email::parse("ana@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email as typed; surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let email = input.trim();
        if email.is_empty() {
            return Err(EmailError::Empty);
        }
        if email.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if email.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = email.split_once('@').ok_or(EmailError::InvalidAt)?;
        if domain.contains('@') {
            return Err(EmailError::InvalidAt);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(email.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }

    /// Part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Email::parse("ana@vitrine.test").is_ok());
        assert!(Email::parse("ana.lima+loja@vitrine.com.br").is_ok());
        assert_eq!(
            Email::parse(" ana@vitrine.test\n").unwrap().as_str(),
            "ana@vitrine.test"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("ana lima@x.com"), Err(EmailError::Whitespace));
        assert_eq!(Email::parse("not-an-email"), Err(EmailError::InvalidAt));
        assert_eq!(Email::parse("a@b@c.com"), Err(EmailError::InvalidAt));
        assert_eq!(Email::parse("@vitrine.test"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("ana@"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@localhost"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@.com"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@vitrine."), Err(EmailError::InvalidDomain));

        let long = format!("{}@vitrine.test", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_parts() {
        let email = Email::parse("ana@vitrine.test").unwrap();
        assert_eq!(email.local_part(), "ana");
        assert_eq!(email.domain(), "vitrine.test");
        assert_eq!(email.to_string(), "ana@vitrine.test");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let email: Email = serde_json::from_str("\"ana@vitrine.test\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ana@vitrine.test\"");
        assert!(serde_json::from_str::<Email>("\"ana@\"").is_err());
    }
}
