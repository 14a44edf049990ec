//! crates/dh_core/src/ids.rs
//! Code newtypes for pacts and districts.
//! Codes are trimmed, non-empty, printable strings; merged pacts carry joined
//! codes such as `"C + J"`, so spaces and `+` are legal inside a code.

use alloc::borrow::ToOwned;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors returned when validating or parsing codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    Empty,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Empty => f.write_str("empty code"),
            IdError::TooLong => f.write_str("code too long"),
            IdError::BadShape => f.write_str("code has surrounding whitespace or control characters"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IdError {}

const MAX_CODE_LEN: usize = 256;

/// Non-empty, no surrounding whitespace, no control characters.
#[inline]
pub fn is_valid_code(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_CODE_LEN
        && s.trim() == s
        && !s.chars().any(char::is_control)
}

fn check_code(s: &str) -> Result<(), IdError> {
    if s.is_empty() { return Err(IdError::Empty); }
    if s.len() > MAX_CODE_LEN { return Err(IdError::TooLong); }
    if !is_valid_code(s) { return Err(IdError::BadShape); }
    Ok(())
}

macro_rules! simple_string_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                check_code(s)?;
                Ok($name(s.to_owned()))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            fn try_from(value: String) -> Result<Self, Self::Error> {
                check_code(&value)?;
                Ok($name(value))
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(value: $name) -> String { value.0 }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str { &self.0 }
        }
    }
}

simple_string_newtype!(
    /// Pact (alliance/list) code, unique within a district: `"C"`, `"J"`, `"C + J"`.
    PactCode
);
simple_string_newtype!(
    /// District identifier, usually the number taken from the source file name.
    DistrictId
);

impl PactCode {
    /// Case-insensitive comparison used when matching user-supplied codes.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_uppercase() == other.trim().to_uppercase()
    }

    /// Join constituent codes with `" + "` (the merged-pact code shape).
    pub fn join(parts: &[PactCode]) -> Result<PactCode, IdError> {
        let joined = parts
            .iter()
            .map(PactCode::as_str)
            .collect::<alloc::vec::Vec<_>>()
            .join(" + ");
        PactCode::try_from(joined)
    }
}
