//! Persistent identifier codec.
//!
//! A persistent id is four signed 32-bit integers that survive respawns and
//! server restarts. Its string form joins the fields with `-`, so a negative
//! field produces a doubled dash: `(123, 456, 789, -12)` is `"123-456-789--12"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Four-field persistent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersistentId([i32; 4]);

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    #[error("persistent id must have 4 fields, found {0}")]
    WrongFieldCount(usize),
    #[error("invalid persistent id field '{0}'")]
    InvalidField(String),
}

impl PersistentId {
    pub fn new(a: i32, b: i32, c: i32, d: i32) -> Self {
        Self([a, b, c, d])
    }

    pub fn parts(&self) -> [i32; 4] {
        self.0
    }

    /// Canonical string form, e.g. `"10-20-30--5"`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Reverse of [`PersistentId::encode`].
    ///
    /// A `-` separates fields only when the previous character is a digit and
    /// the next one is a digit or another `-`; every other `-` is a sign.
    /// Anything other than exactly four integer fields is rejected.
    ///
    /// ```
    /// use sst_bridge::persistent_id::PersistentId;
    ///
    /// let id = PersistentId::decode("10-20-30--5").unwrap();
    /// assert_eq!(id.parts(), [10, 20, 30, -5]);
    /// assert_eq!(id.encode(), "10-20-30--5");
    /// ```
    pub fn decode(value: &str) -> Result<Self, ParseIdError> {
        let chars: Vec<char> = value.chars().collect();
        let mut fields: Vec<i32> = Vec::with_capacity(4);
        let mut current = String::new();

        for (i, &ch) in chars.iter().enumerate() {
            let is_separator = ch == '-'
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars
                    .get(i + 1)
                    .map_or(false, |next| next.is_ascii_digit() || *next == '-');

            if is_separator {
                flush_field(&mut current, &mut fields)?;
            } else {
                current.push(ch);
            }
        }
        flush_field(&mut current, &mut fields)?;

        match fields.as_slice() {
            [a, b, c, d] => Ok(Self([*a, *b, *c, *d])),
            _ => Err(ParseIdError::WrongFieldCount(fields.len())),
        }
    }
}

fn flush_field(current: &mut String, fields: &mut Vec<i32>) -> Result<(), ParseIdError> {
    if current.is_empty() {
        return Ok(());
    }
    let field = std::mem::take(current);
    let value = field
        .parse::<i32>()
        .map_err(|_| ParseIdError::InvalidField(field.clone()))?;
    fields.push(value);
    Ok(())
}

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}-{}-{}-{}", a, b, c, d)
    }
}

impl FromStr for PersistentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for PersistentId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<PersistentId> for String {
    fn from(id: PersistentId) -> Self {
        id.encode()
    }
}
