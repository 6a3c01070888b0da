/// Validated newtypes used inside value specifications.
///
/// Each newtype validates at construction time via [`TryFrom<&str>`]. Serde
/// `Deserialize` impls re-run validation so a malformed pattern file is
/// rejected when it is loaded, not when it is first matched.
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::card::CardValue;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when constructing a validated newtype from an invalid string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewtypeError {
    /// The string did not match the expected format.
    #[error("invalid {type_name}: expected {expected}, got {got:?}")]
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// A human-readable description of the expected format.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A basic-format UTC or offset timestamp such as `20191015T231000Z`.
///
/// Accepted forms are `YYYYMMDDTHHMMSS` followed by `Z`, `±HH` or `±HHMM`.
/// Two timestamps are equal when they denote the same instant, so
/// `20220101T100000Z` equals `20220101T110000+0100`.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<FixedOffset>,
}

impl Timestamp {
    const EXPECTED: &'static str = "YYYYMMDDTHHMMSS followed by Z, +HH or +HHMM";

    /// Returns the string this timestamp was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant.
    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
        let expanded = match s.len() {
            // Hour-only offset: pad the minutes.
            18 => format!("{s}00"),
            n if n > 20 => return None,
            _ => s.to_owned(),
        };
        let normalised = match expanded.strip_suffix('Z') {
            Some(local) => format!("{local}+0000"),
            None => expanded,
        };
        DateTime::parse_from_str(&normalised, "%Y%m%dT%H%M%S%z").ok()
    }
}

impl TryFrom<&str> for Timestamp {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let instant = Self::parse_instant(s).ok_or_else(|| NewtypeError::InvalidFormat {
            type_name: "Timestamp",
            expected: Self::EXPECTED,
            got: s.to_owned(),
        })?;
        Ok(Self {
            raw: s.to_owned(),
            instant,
        })
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CanonicalJson
// ---------------------------------------------------------------------------

/// A JSON document held in canonical (sorted-key, compact) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalJson(String);

impl CanonicalJson {
    /// Parses `s` and returns its canonical form, or `None` if it is not JSON.
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_str::<CardValue>(s)
            .ok()
            .map(|v| Self(v.canonical_json()))
    }

    /// Returns the canonical serialization.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CanonicalJson {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s).ok_or_else(|| NewtypeError::InvalidFormat {
            type_name: "CanonicalJson",
            expected: "a JSON document",
            got: s.to_owned(),
        })
    }
}

impl fmt::Display for CanonicalJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CanonicalJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CanonicalJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}
