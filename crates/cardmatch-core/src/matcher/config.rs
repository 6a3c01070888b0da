use super::pattern::{ParamPattern, PropertyPattern};
use crate::value_spec::ValueSpec;

/// Configuration for one matching run.
///
/// The default configuration carries the baseline patterns every converted
/// record is expected to satisfy (see [`baseline_patterns`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Patterns added for every property name the caller did not constrain.
    pub baseline: Vec<PropertyPattern>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            baseline: baseline_patterns(),
        }
    }
}

impl MatchConfig {
    /// A configuration with no baseline: only caller patterns are expected.
    pub fn without_baseline() -> Self {
        Self {
            baseline: Vec::new(),
        }
    }
}

/// Properties every converted record carries regardless of input.
pub fn baseline_patterns() -> Vec<PropertyPattern> {
    vec![
        PropertyPattern::new("PRODID", ValueSpec::Any).optional(),
        PropertyPattern::new("REV", ValueSpec::Any).optional(),
        PropertyPattern::new("UID", ValueSpec::Any),
        PropertyPattern::new("VERSION", "4.0"),
        PropertyPattern::new("FN", ValueSpec::Any)
            .param(ParamPattern::new("DERIVED", ValueSpec::nocase("TRUE")).optional()),
        PropertyPattern::new("JSPROP", "\"1.0\"")
            .param(ParamPattern::new("JSPTR", "version"))
            .param(ParamPattern::new("VALUE", ValueSpec::nocase("TEXT")).optional())
            .optional(),
        PropertyPattern::new("CREATED", ValueSpec::Any).optional(),
    ]
}
