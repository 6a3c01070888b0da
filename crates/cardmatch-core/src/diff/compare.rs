use tracing::debug;

use crate::card::Card;
use crate::normalize::normalize_in_place;

use super::engine::diff_values;
use super::types::StructuralMismatch;

/// Top-level fields a converter may add on its own. They are compared only
/// when the expected card states them.
const CONVERTER_FIELDS: [&str; 4] = ["created", "updated", "prodId", "vCardProps"];

/// Compares a recovered card against the card that was sent.
///
/// Converter-added fields and vendor-namespaced top-level fields (keys
/// containing `:`) that the expected card does not mention are ignored.
/// Both sides are normalized before diffing. Neither input is modified.
///
/// # Errors
///
/// Returns [`StructuralMismatch`] with every difference if the cards do not
/// agree.
pub fn compare_cards(want: &Card, have: &Card) -> Result<(), StructuralMismatch> {
    let mut want = want.clone();
    let mut have = have.clone();

    if let (Some(expected), Some(observed)) = (want.as_object(), have.as_object_mut()) {
        for field in CONVERTER_FIELDS {
            if !expected.contains_key(field) {
                observed.remove(field);
            }
        }
        observed.retain(|key, _| !key.contains(':') || expected.contains_key(key));
    }

    normalize_in_place(&mut want);
    normalize_in_place(&mut have);

    let diffs = diff_values(&want, &have);
    if diffs.is_empty() {
        Ok(())
    } else {
        debug!(count = diffs.len(), "cards differ");
        Err(StructuralMismatch { diffs })
    }
}
