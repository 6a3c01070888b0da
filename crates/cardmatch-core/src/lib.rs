#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod canonical;
pub mod card;
pub mod diff;
pub mod matcher;
pub mod newtypes;
pub mod normalize;
pub mod patch;
pub mod record;
pub mod scenario;
pub mod value_spec;

pub use canonical::{CanonicalRecord, canonicalize};
pub use card::{Card, CardMap, CardValue, ValueKind};
pub use diff::{CardDiff, DiffKind, StructuralMismatch, compare_cards, diff_values};
pub use matcher::{
    AltIdRef, Binding, BindingConflict, BindingTable, GroupRef, GroupSpec, MatchConfig,
    MatchDiagnostic, MatchFailure, MatchTextError, ParamPattern, PropertyPattern,
    baseline_patterns, match_properties, match_record, match_text,
};
pub use newtypes::{CanonicalJson, NewtypeError, Timestamp};
pub use normalize::{normalize, normalize_in_place};
pub use patch::{
    PatchError, PatchReport, apply_patch, apply_patch_entry, decode_pointer, encode_pointer,
};
pub use record::{
    Parameter, ParseError, Property, Record, parse_property, parse_record, split_unescaped,
};
pub use scenario::{
    Converter, ConverterError, Outcome, RecordedConverter, Recording, Scenario, ScenarioFailure,
    ScenarioResult, run_scenario, run_scenarios,
};
pub use value_spec::{ComponentSpec, ValueSpec};

/// Returns the current version of the cardmatch-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
