use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::value_spec::ValueSpec;

fn default_true() -> bool {
    true
}

/// Deserializes a property or parameter name, upper-casing it so that it
/// compares equal to parsed names.
fn upper_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.to_uppercase())
}

/// An expected parameter on a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamPattern {
    /// Upper-cased parameter name.
    #[serde(deserialize_with = "upper_name")]
    pub name: String,
    /// Acceptable raw values.
    #[serde(default)]
    pub value: ValueSpec,
    /// Whether the parameter must be present.
    #[serde(default = "default_true")]
    pub mandatory: bool,
}

impl ParamPattern {
    /// A mandatory parameter pattern.
    pub fn new(name: &str, value: impl Into<ValueSpec>) -> Self {
        Self {
            name: name.to_uppercase(),
            value: value.into(),
            mandatory: true,
        }
    }

    /// Marks the parameter as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }
}

/// A symbolic reference to an `ALTID` value shared between patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltIdRef {
    /// Symbolic key, scoped to one matching run.
    pub id: String,
    /// Whether the property must carry an `ALTID` parameter.
    #[serde(default = "default_true")]
    pub mandatory: bool,
}

/// A symbolic reference to a group prefix shared between patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Symbolic key, scoped to one matching run.
    pub id: String,
}

/// The group constraint of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSpec {
    /// The property group must equal this string.
    Literal(String),
    /// The property group binds to a symbolic key.
    Ref(GroupRef),
}

/// An expected property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPattern {
    /// Upper-cased property name.
    #[serde(deserialize_with = "upper_name")]
    pub name: String,
    /// Acceptable raw values.
    #[serde(default)]
    pub value: ValueSpec,
    /// Expected parameters, other than `ALTID`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamPattern>,
    /// Whether a property must match this pattern.
    #[serde(default = "default_true")]
    pub mandatory: bool,
    /// `ALTID` linkage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<AltIdRef>,
    /// Group constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupSpec>,
}

impl PropertyPattern {
    /// A mandatory pattern without parameters or linkage.
    pub fn new(name: &str, value: impl Into<ValueSpec>) -> Self {
        Self {
            name: name.to_uppercase(),
            value: value.into(),
            params: Vec::new(),
            mandatory: true,
            alt_id: None,
            group: None,
        }
    }

    /// Adds an expected parameter.
    #[must_use]
    pub fn param(mut self, param: ParamPattern) -> Self {
        self.params.push(param);
        self
    }

    /// Marks the pattern as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }

    /// Requires an `ALTID` parameter bound to the symbolic key `id`.
    #[must_use]
    pub fn alt_id(mut self, id: &str) -> Self {
        self.alt_id = Some(AltIdRef {
            id: id.to_owned(),
            mandatory: true,
        });
        self
    }

    /// Binds an `ALTID` parameter to `id` if the property has one.
    #[must_use]
    pub fn optional_alt_id(mut self, id: &str) -> Self {
        self.alt_id = Some(AltIdRef {
            id: id.to_owned(),
            mandatory: false,
        });
        self
    }

    /// Requires a group prefix bound to the symbolic key `id`.
    #[must_use]
    pub fn group_ref(mut self, id: &str) -> Self {
        self.group = Some(GroupSpec::Ref(GroupRef { id: id.to_owned() }));
        self
    }

    /// Requires exactly this group prefix.
    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(GroupSpec::Literal(group.to_owned()));
        self
    }
}

impl fmt::Display for PropertyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(GroupSpec::Literal(g)) => write!(f, "{g}.")?,
            Some(GroupSpec::Ref(r)) => write!(f, "${}.", r.id)?,
            None => {}
        }
        f.write_str(&self.name)?;
        for p in &self.params {
            write!(f, ";{}={}", p.name, p.value)?;
            if !p.mandatory {
                f.write_str("?")?;
            }
        }
        if let Some(alt) = &self.alt_id {
            write!(f, ";ALTID=${}", alt.id)?;
            if !alt.mandatory {
                f.write_str("?")?;
            }
        }
        write!(f, ":{}", self.value)?;
        if !self.mandatory {
            f.write_str(" (optional)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn names_are_upper_cased() {
        let p = PropertyPattern::new("fn", ValueSpec::Any)
            .param(ParamPattern::new("derived", "TRUE"));
        assert_eq!(p.name, "FN");
        assert_eq!(p.params[0].name, "DERIVED");

        let json = r#"{"name": "tel", "params": [{"name": "type", "value": "any"}]}"#;
        let p: PropertyPattern = serde_json::from_str(json).expect("valid pattern");
        assert_eq!(p.name, "TEL");
        assert_eq!(p.params[0].name, "TYPE");
    }

    #[test]
    fn deserialize_defaults() {
        let p: PropertyPattern = serde_json::from_str(r#"{"name": "UID"}"#).expect("valid");
        assert_eq!(p, PropertyPattern::new("UID", ValueSpec::Any));
        let alt: AltIdRef = serde_json::from_str(r#"{"id": "1"}"#).expect("valid");
        assert!(alt.mandatory);
    }

    #[test]
    fn deserialize_linkage() {
        let json = r#"{
            "name": "X-ABLABEL",
            "value": {"literal": "foo"},
            "mandatory": false,
            "alt_id": {"id": "a", "mandatory": false},
            "group": {"ref": {"id": "g1"}}
        }"#;
        let p: PropertyPattern = serde_json::from_str(json).expect("valid");
        assert_eq!(
            p,
            PropertyPattern::new("X-ABLABEL", "foo")
                .optional()
                .optional_alt_id("a")
                .group_ref("g1")
        );
    }

    #[test]
    fn display_shows_constraints() {
        let p = PropertyPattern::new("N", "Doe;Jane;;;")
            .param(ParamPattern::new("LANGUAGE", "de").optional())
            .alt_id("1")
            .group_ref("g");
        assert_eq!(
            p.to_string(),
            r#"$g.N;LANGUAGE="de"?;ALTID=$1:"Doe;Jane;;;""#
        );
    }
}
