//! Chilean RUT (Rol Único Tributario) type.
//!
//! Patient RUTs are captured at the counter when a controlled drug is sold
//! and end up in the backend compliance log, so they are validated before
//! the sale is allowed to proceed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Rut`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RutError {
    /// The input string is empty.
    #[error("RUT cannot be empty")]
    Empty,
    /// The body is not made of digits or has the wrong length.
    #[error("RUT body must be {min} to {max} digits")]
    InvalidBody {
        /// Minimum number of digits.
        min: usize,
        /// Maximum number of digits.
        max: usize,
    },
    /// The check digit is not `0-9` or `K`.
    #[error("RUT check digit must be 0-9 or K")]
    InvalidCheckDigit,
    /// The check digit does not match the body.
    #[error("RUT check digit does not match (expected {expected})")]
    Mismatch {
        /// The check digit computed from the body.
        expected: char,
    },
}

/// A validated Chilean RUT.
///
/// Accepts the usual written forms (`12.345.678-5`, `12345678-5`,
/// `123456785`) and normalizes to `12345678-5` with an upper-case `K`.
///
/// ## Examples
///
/// ```
/// use farmacia_core::Rut;
///
/// let rut = Rut::parse("12.345.678-5").unwrap();
/// assert_eq!(rut.as_str(), "12345678-5");
///
/// assert!(Rut::parse("12345678-9").is_err()); // wrong check digit
/// assert!(Rut::parse("").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Rut(String);

impl Rut {
    const MIN_BODY: usize = 1;
    const MAX_BODY: usize = 8;

    /// Parse and normalize a RUT.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, malformed, or the check digit
    /// does not match the body.
    pub fn parse(s: &str) -> Result<Self, RutError> {
        let cleaned: String = s
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let Some(check) = cleaned.chars().last() else {
            return Err(RutError::Empty);
        };
        let body = &cleaned[..cleaned.len() - check.len_utf8()];

        if body.len() < Self::MIN_BODY
            || body.len() > Self::MAX_BODY
            || !body.chars().all(|c| c.is_ascii_digit())
        {
            return Err(RutError::InvalidBody {
                min: Self::MIN_BODY,
                max: Self::MAX_BODY,
            });
        }

        if !(check.is_ascii_digit() || check == 'K') {
            return Err(RutError::InvalidCheckDigit);
        }

        let expected = check_digit(body);
        if expected != check {
            return Err(RutError::Mismatch { expected });
        }

        Ok(Self(format!("{body}-{check}")))
    }

    /// Returns the normalized RUT as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric body (without check digit).
    #[must_use]
    pub fn body(&self) -> &str {
        self.0.split('-').next().unwrap_or("")
    }
}

/// Modulo-11 check digit over the body digits.
fn check_digit(body: &str) -> char {
    let sum: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip([2, 3, 4, 5, 6, 7].into_iter().cycle())
        .map(|(d, w)| d * w)
        .sum();

    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Rut {
    type Err = RutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rut {
    type Error = RutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(rut: Rut) -> Self {
        rut.0
    }
}

impl AsRef<str> for Rut {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
