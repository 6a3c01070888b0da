/// Expected-value specifications and their equivalence test against raw
/// text-format values.
///
/// A [`ValueSpec`] describes the set of raw strings that are acceptable
/// encodings of one expected value. Matching never fails with an error: a
/// value that cannot be interpreted (bad JSON, bad timestamp) simply does
/// not match.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::newtypes::{CanonicalJson, Timestamp};
use crate::record::split_unescaped;

/// One position of a [`ValueSpec::Components`] value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentSpec {
    /// The subcomponent must equal this string exactly.
    Literal(String),
    /// The subcomponent, split on unescaped commas, must equal this set.
    Set(BTreeSet<String>),
}

impl ComponentSpec {
    /// Builds a [`ComponentSpec::Set`].
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    fn matches(&self, observed: &str) -> bool {
        match self {
            Self::Literal(want) => want == observed,
            Self::Set(want) => {
                let have: BTreeSet<&str> = split_unescaped(observed, ',').into_iter().collect();
                have.len() == want.len() && want.iter().all(|w| have.contains(w.as_str()))
            }
        }
    }
}

impl From<&str> for ComponentSpec {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

/// The set of raw strings acceptable for one expected value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpec {
    /// Any value matches.
    #[default]
    Any,
    /// Exact string equality.
    Literal(String),
    /// Equality after upper-casing both sides.
    CaseInsensitive(String),
    /// Any of the alternatives matches.
    OneOf(Vec<ValueSpec>),
    /// The literal, bare or wrapped in one pair of double quotes.
    QuoteTolerant(String),
    /// The literal, or the literal with `\,` written for `,`.
    EscapeTolerant(String),
    /// A `;`-separated structured value.
    Components(Vec<ComponentSpec>),
    /// A JSON document embedded in a text value, compared ignoring key order.
    JsonText(CanonicalJson),
    /// A basic-format timestamp, compared as an instant.
    Timestamp(Timestamp),
}

impl ValueSpec {
    /// Builds a [`ValueSpec::Literal`].
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// Builds a [`ValueSpec::CaseInsensitive`].
    pub fn nocase(s: impl Into<String>) -> Self {
        Self::CaseInsensitive(s.into())
    }

    /// Builds a [`ValueSpec::OneOf`].
    pub fn one_of<I>(alternatives: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ValueSpec>,
    {
        Self::OneOf(alternatives.into_iter().map(Into::into).collect())
    }

    /// Builds a [`ValueSpec::Components`].
    pub fn components<I>(components: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ComponentSpec>,
    {
        Self::Components(components.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if `observed` is an acceptable encoding.
    pub fn matches(&self, observed: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Literal(want) => want == observed,
            Self::CaseInsensitive(want) => want.to_uppercase() == observed.to_uppercase(),
            Self::OneOf(alternatives) => alternatives.iter().any(|alt| alt.matches(observed)),
            Self::QuoteTolerant(want) => {
                want == observed
                    || observed
                        .strip_prefix('"')
                        .and_then(|s| s.strip_suffix('"'))
                        .is_some_and(|inner| inner == want)
            }
            Self::EscapeTolerant(want) => {
                want == observed || *want == observed.replace("\\,", ",")
            }
            Self::Components(want) => {
                let have = split_unescaped(observed, ';');
                have.len() == want.len()
                    && want.iter().zip(&have).all(|(w, h)| w.matches(h))
            }
            Self::JsonText(want) => {
                let unescaped = observed.replace("\\,", ",").replace("\\\\", "\\");
                CanonicalJson::parse(&unescaped).is_some_and(|have| have == *want)
            }
            Self::Timestamp(want) => {
                Timestamp::try_from(observed).is_ok_and(|have| have == *want)
            }
        }
    }
}

impl From<&str> for ValueSpec {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for ValueSpec {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::Set(items) => {
                let items: Vec<_> = items.iter().map(|s| format!("{s:?}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

impl fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::CaseInsensitive(s) => write!(f, "nocase({s:?})"),
            Self::OneOf(alts) => {
                let alts: Vec<_> = alts.iter().map(ToString::to_string).collect();
                write!(f, "one_of({})", alts.join(" | "))
            }
            Self::QuoteTolerant(s) => write!(f, "maybe_quoted({s:?})"),
            Self::EscapeTolerant(s) => write!(f, "maybe_escaped({s:?})"),
            Self::Components(comps) => {
                let comps: Vec<_> = comps.iter().map(ToString::to_string).collect();
                write!(f, "components({})", comps.join("; "))
            }
            Self::JsonText(j) => write!(f, "json({j})"),
            Self::Timestamp(t) => write!(f, "timestamp({t})"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(ValueSpec::Any.matches(""));
        assert!(ValueSpec::Any.matches("whatever"));
    }

    #[test]
    fn case_insensitive_ignores_case_both_ways() {
        let spec = ValueSpec::nocase("Work");
        assert!(spec.matches("WORK"));
        assert!(spec.matches("work"));
        assert!(!spec.matches("home"));
    }

    #[test]
    fn one_of_accepts_nested_specs() {
        let spec = ValueSpec::one_of([
            ValueSpec::nocase("HOME,VOICE"),
            ValueSpec::nocase("VOICE,HOME"),
        ]);
        assert!(spec.matches("voice,home"));
        assert!(!spec.matches("voice"));
        let literals = ValueSpec::one_of(["Doe;Jane;;;", "Doe;Jane;;;;;"]);
        assert!(literals.matches("Doe;Jane;;;;;"));
    }

    #[test]
    fn quote_tolerant_allows_one_layer() {
        let spec = ValueSpec::QuoteTolerant("1.0".to_owned());
        assert!(spec.matches("1.0"));
        assert!(spec.matches("\"1.0\""));
        assert!(!spec.matches("\"\"1.0\"\""));
        assert!(!spec.matches("\"1.0"));
    }

    #[test]
    fn escape_tolerant_unescapes_commas() {
        let spec = ValueSpec::EscapeTolerant("ldap:///o=Example,c=US".to_owned());
        assert!(spec.matches("ldap:///o=Example,c=US"));
        assert!(spec.matches("ldap:///o=Example\\,c=US"));
        assert!(!spec.matches("ldap:///o=Example;c=US"));
    }

    #[test]
    fn components_literal_and_set_slots() {
        let spec = ValueSpec::Components(vec!["a".into(), ComponentSpec::set(["x", "y"])]);
        assert!(spec.matches("a;y,x"));
        assert!(!spec.matches("a;y,x,z"));
        assert!(!spec.matches("a"));
        assert!(!spec.matches("b;x,y"));
    }

    #[test]
    fn components_respect_escaped_separators() {
        let spec = ValueSpec::components(["a\\;b", "c"]);
        assert!(spec.matches("a\\;b;c"));
        let set = ValueSpec::Components(vec![ComponentSpec::set(["x\\,y", "z"])]);
        assert!(set.matches("z,x\\,y"));
    }

    #[test]
    fn components_set_compares_as_set() {
        let spec = ValueSpec::Components(vec![ComponentSpec::set(["internet", "IETF"])]);
        assert!(spec.matches("IETF,internet"));
        assert!(spec.matches("internet,IETF,internet"));
        assert!(!spec.matches("internet"));
    }

    #[test]
    fn json_text_ignores_key_order_and_escapes() {
        let want = CanonicalJson::try_from(r#"{"a":1,"b":[1,2]}"#).expect("json");
        let spec = ValueSpec::JsonText(want);
        assert!(spec.matches(r#"{"b":[1\,2]\,"a":1}"#));
        assert!(!spec.matches(r#"{"a":2\,"b":[1\,2]}"#));
        assert!(!spec.matches("not json"));
    }

    #[test]
    fn timestamp_compares_instants() {
        let spec = ValueSpec::Timestamp(Timestamp::try_from("20191015T231000Z").expect("ts"));
        assert!(spec.matches("20191015T231000Z"));
        assert!(spec.matches("20191016T011000+0200"));
        assert!(!spec.matches("20191015T231001Z"));
        assert!(!spec.matches("2019-10-15"));
    }

    #[test]
    fn deserializes_tagged_forms() {
        let spec: ValueSpec = serde_json::from_str(
            r#"{"one_of": ["any", {"literal": "x"}, {"components": ["a", ["x", "y"]]}]}"#,
        )
        .expect("valid spec");
        assert_eq!(
            spec,
            ValueSpec::OneOf(vec![
                ValueSpec::Any,
                ValueSpec::literal("x"),
                ValueSpec::Components(vec!["a".into(), ComponentSpec::set(["x", "y"])]),
            ])
        );
        let bad = serde_json::from_str::<ValueSpec>(r#"{"timestamp": "yesterday"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn display_is_compact() {
        let spec = ValueSpec::one_of([ValueSpec::Any, ValueSpec::nocase("x")]);
        assert_eq!(spec.to_string(), r#"one_of(* | nocase("x"))"#);
    }
}
