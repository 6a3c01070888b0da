/// The JSON-like tree that contact cards are compared on.
///
/// [`CardValue`] is a closed tagged variant over maps, lists and scalars.
/// Normalization, patch application and structural diffing all walk this
/// type instead of probing `serde_json::Value` shapes at runtime.
///
/// The integer/float distinction is kept: `1` and `1.0` are different
/// values, as they are different encodings of a card property.
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A node of a card tree.
#[derive(Debug, Clone)]
pub enum CardValue {
    /// JSON `null`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (fits in i64).
    Integer(i64),
    /// Unsigned integer that does not fit in i64.
    UnsignedInteger(u64),
    /// IEEE 754 double-precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    Array(Vec<CardValue>),
    /// String-keyed map. Keys iterate in sorted order.
    Object(BTreeMap<String, CardValue>),
}

/// A whole card: by convention an [`CardValue::Object`] at the top level.
pub type Card = CardValue;

/// A string-keyed map of card values.
pub type CardMap = BTreeMap<String, CardValue>;

/// Coarse shape of a [`CardValue`], used where maps, lists and scalars are
/// treated differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// An [`CardValue::Object`].
    Map,
    /// An [`CardValue::Array`].
    List,
    /// Anything else.
    Scalar,
}

impl PartialEq for CardValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::UnsignedInteger(a), Self::UnsignedInteger(b)) => a == b,
            (Self::Integer(a), Self::UnsignedInteger(b))
            | (Self::UnsignedInteger(b), Self::Integer(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl CardValue {
    /// Returns the string value if this is a `CardValue::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Array(_)
            | Self::Object(_) => None,
        }
    }

    /// Returns the bool value if this is a `CardValue::Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Null
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Array(_)
            | Self::Object(_) => None,
        }
    }

    /// Returns the inner map if this is a `CardValue::Object`.
    pub fn as_object(&self) -> Option<&CardMap> {
        match self {
            Self::Object(m) => Some(m),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Array(_) => None,
        }
    }

    /// Mutable variant of [`CardValue::as_object`].
    pub fn as_object_mut(&mut self) -> Option<&mut CardMap> {
        match self {
            Self::Object(m) => Some(m),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Array(_) => None,
        }
    }

    /// Returns the inner list if this is a `CardValue::Array`.
    pub fn as_array(&self) -> Option<&Vec<CardValue>> {
        match self {
            Self::Array(a) => Some(a),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Object(_) => None,
        }
    }

    /// Mutable variant of [`CardValue::as_array`].
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<CardValue>> {
        match self {
            Self::Array(a) => Some(a),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Object(_) => None,
        }
    }

    /// Index into an object by key.
    pub fn get(&self, key: &str) -> Option<&CardValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Returns the coarse shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Object(_) => ValueKind::Map,
            Self::Array(_) => ValueKind::List,
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::String(_) => ValueKind::Scalar,
        }
    }

    /// Compact serialization with map keys in sorted order.
    ///
    /// Two values that are equal under [`PartialEq`] always produce the
    /// same string, regardless of the key order they were parsed from.
    pub fn canonical_json(&self) -> String {
        // Object keys are strings and non-finite floats serialize as null,
        // so serialization into a String cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<&str> for CardValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for CardValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for CardValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for CardValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl Serialize for CardValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::UnsignedInteger(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(arr) => arr.serialize(serializer),
            Self::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CardValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CardValueVisitor)
    }
}

struct CardValueVisitor;

impl<'de> Visitor<'de> for CardValueVisitor {
    type Value = CardValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<CardValue, E> {
        Ok(CardValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CardValue, E> {
        Ok(CardValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CardValue, E> {
        match i64::try_from(v) {
            Ok(i) => Ok(CardValue::Integer(i)),
            Err(_) => Ok(CardValue::UnsignedInteger(v)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CardValue, E> {
        Ok(CardValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CardValue, E> {
        Ok(CardValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CardValue, E> {
        Ok(CardValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<CardValue, E> {
        Ok(CardValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<CardValue, E> {
        Ok(CardValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<CardValue, D::Error> {
        CardValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CardValue, A::Error> {
        let mut arr = Vec::new();
        while let Some(elem) = seq.next_element()? {
            arr.push(elem);
        }
        Ok(CardValue::Array(arr))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CardValue, A::Error> {
        let mut obj = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, CardValue>()? {
            obj.insert(key, value);
        }
        Ok(CardValue::Object(obj))
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_json())
    }
}
