/// Pattern-based validation of text-format records.
///
/// A record is accepted when every property is consumed by exactly one
/// expected [`PropertyPattern`] and every mandatory pattern consumes a
/// property. Consumption is greedy and first-fit: properties are visited in
/// canonical order and each takes the first remaining pattern with its name
/// that accepts it. A property that a later pattern would have needed is not
/// reconsidered, so a pattern set can be rejected even though a perfect
/// assignment exists.
///
/// Symbolic `ALTID` and group references are bound through per-run
/// [`BindingTable`]s. A candidate that fails part-way through evaluation
/// leaves no bindings behind.
mod bindings;
mod config;
mod pattern;


use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::canonical::canonicalize;
use crate::record::{ParseError, Property, Record, parse_record};

pub use bindings::{Binding, BindingConflict, BindingTable};
pub use config::{MatchConfig, baseline_patterns};
pub use pattern::{AltIdRef, GroupRef, GroupSpec, ParamPattern, PropertyPattern};

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// One problem found while matching a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchDiagnostic {
    /// No pattern exists (any longer) for the property's name.
    Unexpected {
        /// The offending property.
        property: Property,
    },
    /// Patterns exist for the name but none accepts the property.
    Mismatched {
        /// The offending property.
        property: Property,
        /// Snapshot of the remaining patterns for its name.
        candidates: Vec<PropertyPattern>,
    },
    /// Mandatory patterns left unconsumed after all properties were seen.
    Unmatched {
        /// The unconsumed mandatory patterns.
        patterns: Vec<PropertyPattern>,
    },
}

impl fmt::Display for MatchDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexpected { property } => write!(f, "unexpected property {property}"),
            Self::Mismatched {
                property,
                candidates,
            } => {
                write!(f, "mismatched property {property}; candidates:")?;
                for c in candidates {
                    write!(f, "\n    {c}")?;
                }
                Ok(())
            }
            Self::Unmatched { patterns } => {
                f.write_str("unmatched patterns:")?;
                for p in patterns {
                    write!(f, "\n    {p}")?;
                }
                Ok(())
            }
        }
    }
}

/// A record that did not satisfy its patterns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record does not match: {} problem(s)", .diagnostics.len())]
pub struct MatchFailure {
    /// Every problem found, in the order it was found.
    pub diagnostics: Vec<MatchDiagnostic>,
}

/// Errors from [`match_text`].
#[derive(Debug, thiserror::Error)]
pub enum MatchTextError {
    /// The input is not a well-formed record.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The record does not start with `BEGIN` and end with `END` around a
    /// non-empty body.
    #[error("record is missing its BEGIN/END envelope")]
    MissingEnvelope,
    /// The record parsed but did not satisfy the patterns.
    #[error(transparent)]
    Mismatch(#[from] MatchFailure),
}

// ---------------------------------------------------------------------------
// Candidate evaluation
// ---------------------------------------------------------------------------

/// Why a candidate pattern rejected a property. Only logged.
#[derive(Debug)]
enum Rejection {
    Value,
    UnexpectedParam(String),
    MissingParam(String),
    MultipleAltIds,
    MissingAltId,
    AltId(BindingConflict),
    MissingGroup,
    GroupLiteral,
    Group(BindingConflict),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value differs"),
            Self::UnexpectedParam(p) => write!(f, "parameter {p} not accepted"),
            Self::MissingParam(name) => write!(f, "missing parameter {name}"),
            Self::MultipleAltIds => f.write_str("more than one ALTID"),
            Self::MissingAltId => f.write_str("missing ALTID"),
            Self::AltId(c) | Self::Group(c) => c.fmt(f),
            Self::MissingGroup => f.write_str("missing group"),
            Self::GroupLiteral => f.write_str("group differs"),
        }
    }
}

/// Bindings an accepted candidate asks to commit.
#[derive(Debug, Default)]
struct Proposal {
    alt_id: Option<(String, String)>,
    group: Option<(String, String)>,
}

fn match_params(patterns: &[ParamPattern], prop: &Property) -> Result<(), Rejection> {
    let mut remaining: Vec<&ParamPattern> = patterns.iter().collect();
    for param in prop.params.iter().filter(|p| p.name != "ALTID") {
        let pos = remaining
            .iter()
            .position(|pp| pp.name == param.name && pp.value.matches(&param.value));
        match pos {
            Some(idx) => {
                remaining.remove(idx);
            }
            None => return Err(Rejection::UnexpectedParam(param.to_string())),
        }
    }
    match remaining.into_iter().find(|pp| pp.mandatory) {
        Some(pp) => Err(Rejection::MissingParam(pp.name.clone())),
        None => Ok(()),
    }
}

fn evaluate(
    pattern: &PropertyPattern,
    prop: &Property,
    alt_ids: &BindingTable,
    groups: &BindingTable,
) -> Result<Proposal, Rejection> {
    if !pattern.value.matches(&prop.value) {
        return Err(Rejection::Value);
    }
    match_params(&pattern.params, prop)?;

    let mut proposal = Proposal::default();

    let alt_params: Vec<_> = prop.params_named("ALTID").collect();
    if alt_params.len() > 1 {
        return Err(Rejection::MultipleAltIds);
    }
    if let Some(alt) = &pattern.alt_id {
        match alt_params.first() {
            Some(param) => match alt_ids.resolve(&alt.id, &param.value) {
                Ok(Binding::Existing) => {}
                Ok(Binding::Fresh) => {
                    proposal.alt_id = Some((alt.id.clone(), param.value.clone()));
                }
                Err(conflict) => return Err(Rejection::AltId(conflict)),
            },
            None if alt.mandatory => return Err(Rejection::MissingAltId),
            None => {}
        }
    }

    match &pattern.group {
        Some(GroupSpec::Literal(want)) => {
            if prop.group.as_deref() != Some(want.as_str()) {
                return Err(Rejection::GroupLiteral);
            }
        }
        Some(GroupSpec::Ref(group_ref)) => {
            let Some(observed) = prop.group.as_deref() else {
                return Err(Rejection::MissingGroup);
            };
            match groups.resolve(&group_ref.id, observed) {
                Ok(Binding::Existing) => {}
                Ok(Binding::Fresh) => {
                    proposal.group = Some((group_ref.id.clone(), observed.to_owned()));
                }
                Err(conflict) => return Err(Rejection::Group(conflict)),
            }
        }
        None => {}
    }

    Ok(proposal)
}

// ---------------------------------------------------------------------------
// Matching run
// ---------------------------------------------------------------------------

struct MatchRun {
    candidates: BTreeMap<String, Vec<PropertyPattern>>,
    alt_ids: BindingTable,
    groups: BindingTable,
    diagnostics: Vec<MatchDiagnostic>,
}

impl MatchRun {
    fn new(patterns: &[PropertyPattern], config: &MatchConfig) -> Self {
        let mut candidates: BTreeMap<String, Vec<PropertyPattern>> = BTreeMap::new();
        for p in patterns {
            candidates.entry(p.name.clone()).or_default().push(p.clone());
        }
        for p in &config.baseline {
            if !patterns.iter().any(|user| user.name == p.name) {
                candidates.entry(p.name.clone()).or_default().push(p.clone());
            }
        }
        Self {
            candidates,
            alt_ids: BindingTable::new(),
            groups: BindingTable::new(),
            diagnostics: Vec::new(),
        }
    }

    fn consume(&mut self, prop: &Property) {
        let Some(remaining) = self.candidates.get_mut(&prop.name) else {
            debug!(property = %prop, "no pattern for property");
            self.diagnostics.push(MatchDiagnostic::Unexpected {
                property: prop.clone(),
            });
            return;
        };

        let mut accepted = None;
        for (idx, candidate) in remaining.iter().enumerate() {
            match evaluate(candidate, prop, &self.alt_ids, &self.groups) {
                Ok(proposal) => {
                    accepted = Some((idx, proposal));
                    break;
                }
                Err(reason) => {
                    trace!(property = %prop, pattern = %candidate, %reason, "candidate rejected");
                }
            }
        }

        let Some((idx, proposal)) = accepted else {
            debug!(property = %prop, candidates = remaining.len(), "property mismatched");
            self.diagnostics.push(MatchDiagnostic::Mismatched {
                property: prop.clone(),
                candidates: remaining.clone(),
            });
            return;
        };

        remaining.remove(idx);
        let exhausted = remaining.is_empty();
        if exhausted {
            self.candidates.remove(&prop.name);
        }
        if let Some((id, value)) = proposal.alt_id {
            self.alt_ids.bind(&id, &value);
        }
        if let Some((id, value)) = proposal.group {
            self.groups.bind(&id, &value);
        }
    }

    fn finish(mut self) -> Result<(), MatchFailure> {
        let unmatched: Vec<PropertyPattern> = self
            .candidates
            .into_values()
            .flatten()
            .filter(|p| p.mandatory)
            .collect();
        if !unmatched.is_empty() {
            debug!(count = unmatched.len(), "mandatory patterns unmatched");
            self.diagnostics
                .push(MatchDiagnostic::Unmatched { patterns: unmatched });
        }
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(MatchFailure {
                diagnostics: self.diagnostics,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Matches `properties`, in the given order, against `patterns` plus the
/// baseline patterns of `config` for names `patterns` leaves unconstrained.
///
/// # Errors
///
/// Returns [`MatchFailure`] carrying every diagnostic if the properties do
/// not satisfy the patterns.
pub fn match_properties(
    properties: &[Property],
    patterns: &[PropertyPattern],
    config: &MatchConfig,
) -> Result<(), MatchFailure> {
    let mut run = MatchRun::new(patterns, config);
    for prop in properties {
        run.consume(prop);
    }
    run.finish()
}

/// Canonicalizes `record` and matches its body, without the envelope.
///
/// # Errors
///
/// Returns [`MatchFailure`] if the record does not satisfy the patterns.
pub fn match_record(
    record: &Record,
    patterns: &[PropertyPattern],
    config: &MatchConfig,
) -> Result<(), MatchFailure> {
    let canonical = canonicalize(record);
    match_properties(&canonical.properties, patterns, config)
}

/// Parses `text`, requires a `BEGIN`/`END` envelope, and matches the body.
///
/// # Errors
///
/// Returns [`MatchTextError::Parse`] for malformed input,
/// [`MatchTextError::MissingEnvelope`] if the envelope is absent, and
/// [`MatchTextError::Mismatch`] if the body does not satisfy the patterns.
pub fn match_text(
    text: &str,
    patterns: &[PropertyPattern],
    config: &MatchConfig,
) -> Result<(), MatchTextError> {
    let record = parse_record(text)?;
    let canonical = canonicalize(&record);
    if canonical.envelope.is_none() {
        return Err(MatchTextError::MissingEnvelope);
    }
    match_properties(&canonical.properties, patterns, config)?;
    Ok(())
}
