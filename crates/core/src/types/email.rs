//! Shopper email addresses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a string is not a usable email address.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is blank")]
    Blank,
    #[error("email is longer than {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email must have exactly one @ with text on both sides")]
    BadShape,
    #[error("email domain needs a dot, as in example.com")]
    NoDomainDot,
}

/// An email address as checkout accepts it.
///
/// The check is the one the shipping form has always applied: something,
/// an `@`, then a domain with a dot inside it. Deliverability is the
/// backend's problem.
///
/// ```
/// use tidewater_core::Email;
///
/// assert!(Email::parse("ada@example.com").is_ok());
/// assert!(Email::parse("ada@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate `input` as an address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        if input.is_empty() {
            return Err(EmailError::Blank);
        }
        if input.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        let mut halves = input.split('@');
        let (Some(local), Some(domain), None) = (halves.next(), halves.next(), halves.next())
        else {
            return Err(EmailError::BadShape);
        };
        if local.is_empty() || domain.is_empty() || input.contains(char::is_whitespace) {
            return Err(EmailError::BadShape);
        }

        // The dot may not open or close the domain.
        let mut inner = domain.chars();
        inner.next();
        inner.next_back();
        if !inner.as_str().contains('.') {
            return Err(EmailError::NoDomainDot);
        }

        Ok(Self(input.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
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
