use std::collections::BTreeSet;

use crate::card::{CardMap, CardValue};
use crate::patch::encode_pointer;

use super::types::CardDiff;

/// Returns every difference between `want` and `have`.
///
/// Map keys are visited in ascending order. Lists are compared element by
/// element only when their lengths agree; otherwise the whole list is one
/// difference. A map, list and scalar never compare equal to one another.
pub fn diff_values(want: &CardValue, have: &CardValue) -> Vec<CardDiff> {
    let mut diffs = Vec::new();
    let mut segments = Vec::new();
    diff_into(want, have, &mut segments, &mut diffs);
    diffs
}

fn diff_into(
    want: &CardValue,
    have: &CardValue,
    segments: &mut Vec<String>,
    out: &mut Vec<CardDiff>,
) {
    match (want, have) {
        (CardValue::Object(a), CardValue::Object(b)) => diff_maps(a, b, segments, out),
        (CardValue::Array(a), CardValue::Array(b)) if a.len() == b.len() => {
            for (idx, (x, y)) in a.iter().zip(b).enumerate() {
                segments.push(idx.to_string());
                diff_into(x, y, segments, out);
                segments.pop();
            }
        }
        _ => {
            if want != have {
                out.push(CardDiff::changed(
                    encode_pointer(segments),
                    want.clone(),
                    have.clone(),
                ));
            }
        }
    }
}

fn diff_maps(a: &CardMap, b: &CardMap, segments: &mut Vec<String>, out: &mut Vec<CardDiff>) {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    for key in keys {
        segments.push(key.clone());
        match (a.get(key), b.get(key)) {
            (Some(x), Some(y)) => diff_into(x, y, segments, out),
            (Some(x), None) => out.push(CardDiff::missing(encode_pointer(segments), x.clone())),
            (None, Some(y)) => out.push(CardDiff::unexpected(encode_pointer(segments), y.clone())),
            (None, None) => {}
        }
        segments.pop();
    }
}
