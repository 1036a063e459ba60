//! Human-readable item serial numbers
//!
//! A serial is a two-letter prefix followed by a zero-padded three digit
//! counter, e.g. `AA001`. Serials are issued in strictly increasing order:
//! `AA001`, `AA002`, ... `AA999`, `AB001`, ... `ZZ999`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest counter value a prefix can carry
const MAX_NUMBER: u16 = 999;

/// A serial number like `AA001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber {
    prefix: [u8; 2],
    number: u16,
}

impl SerialNumber {
    /// The first serial ever issued
    pub const FIRST: SerialNumber = SerialNumber {
        prefix: *b"AA",
        number: 1,
    };

    /// Build a serial from its parts
    pub fn new(prefix: &str, number: u16) -> Result<Self, SerialParseError> {
        let prefix = parse_prefix(prefix)?;
        if number > MAX_NUMBER {
            return Err(SerialParseError::NumberOutOfRange(number.to_string()));
        }
        Ok(Self { prefix, number })
    }

    /// Parse a serial from a string
    pub fn parse(s: &str) -> Result<Self, SerialParseError> {
        s.parse()
    }

    /// The two-letter prefix
    pub fn prefix(&self) -> &str {
        // Only ASCII uppercase letters are ever stored
        std::str::from_utf8(&self.prefix).unwrap_or("??")
    }

    /// The numeric suffix
    pub fn number(&self) -> u16 {
        self.number
    }

    /// The serial that follows this one, or `None` once `ZZ999` is reached
    ///
    /// The counter is incremented within the prefix. When the counter is
    /// exhausted the prefix advances (`AA999` -> `AB001`, `AZ999` -> `BA001`).
    pub fn next(&self) -> Option<Self> {
        if self.number < MAX_NUMBER {
            return Some(Self {
                prefix: self.prefix,
                number: self.number + 1,
            });
        }

        let [first, second] = self.prefix;
        let prefix = if second < b'Z' {
            [first, second + 1]
        } else if first < b'Z' {
            [first + 1, b'A']
        } else {
            return None;
        };

        Some(Self { prefix, number: 1 })
    }
}

fn parse_prefix(s: &str) -> Result<[u8; 2], SerialParseError> {
    match s.as_bytes() {
        [a, b] if a.is_ascii_uppercase() && b.is_ascii_uppercase() => Ok([*a, *b]),
        _ => Err(SerialParseError::InvalidPrefix(s.to_string())),
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.prefix(), self.number)
    }
}

impl FromStr for SerialNumber {
    type Err = SerialParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 5 || !s.is_ascii() {
            return Err(SerialParseError::InvalidLength(s.to_string()));
        }

        let (prefix_str, number_str) = s.split_at(2);
        let prefix = parse_prefix(prefix_str)?;

        if !number_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SerialParseError::InvalidNumber(number_str.to_string()));
        }
        let number: u16 = number_str
            .parse()
            .map_err(|_| SerialParseError::InvalidNumber(number_str.to_string()))?;

        Ok(Self { prefix, number })
    }
}

impl Serialize for SerialNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SerialNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing serial numbers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerialParseError {
    #[error("serial number must be 5 characters (e.g. AA001): '{0}'")]
    InvalidLength(String),

    #[error("serial prefix must be two uppercase letters: '{0}'")]
    InvalidPrefix(String),

    #[error("serial suffix must be three digits: '{0}'")]
    InvalidNumber(String),

    #[error("serial counter out of range (max 999): {0}")]
    NumberOutOfRange(String),
}
