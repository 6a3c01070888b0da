/// Structural comparison of two cards.
///
/// [`diff_values`] walks two trees in parallel and reports every path where
/// they disagree. [`compare_cards`] is the full round-trip check: it removes
/// fields the converter is free to add, normalizes both cards, and diffs
/// them.
mod compare;
mod engine;
mod types;


pub use compare::compare_cards;
pub use engine::diff_values;
pub use types::{CardDiff, DiffKind, StructuralMismatch};
