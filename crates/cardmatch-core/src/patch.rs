/// Pointer-path patches over a [`CardValue`] tree.
///
/// A patch is a flat map from slash-delimited paths to replacement values.
/// Segments are unescaped (`~1` to `/`, `~0` to `~`) except under a leading
/// `localizations` segment, whose keys are already escaped paths and are
/// used verbatim.
use std::collections::BTreeMap;

use crate::card::CardValue;

/// Top-level key whose nested keys are raw, unescaped paths.
pub const LOCALIZATIONS: &str = "localizations";

/// A patch entry that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// The path has no segments.
    #[error("empty patch path")]
    EmptyPath,
    /// A list was reached and the segment is not an in-range index.
    #[error("{path}: {segment:?} is not an index into a list of {len}")]
    InvalidIndex {
        /// The full patch path.
        path: String,
        /// The offending segment.
        segment: String,
        /// Length of the list.
        len: usize,
    },
    /// An intermediate map key does not exist.
    #[error("{path}: no key {segment:?}")]
    MissingKey {
        /// The full patch path.
        path: String,
        /// The missing key.
        segment: String,
    },
    /// The path descends through a scalar.
    #[error("{path}: cannot descend into a scalar at {segment:?}")]
    NotAContainer {
        /// The full patch path.
        path: String,
        /// The segment that was to be looked up in the scalar.
        segment: String,
    },
}

/// Outcome of [`apply_patch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Number of entries applied.
    pub applied: usize,
    /// Entries that failed, in path order.
    pub rejected: Vec<PatchError>,
}

impl PatchReport {
    /// Returns `true` if every entry applied.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Splits `path` into segments, unescaping each unless the first segment is
/// `localizations`.
pub fn decode_pointer(path: &str) -> Vec<String> {
    let raw: Vec<&str> = path.split('/').collect();
    if raw.first() == Some(&LOCALIZATIONS) {
        return raw.into_iter().map(str::to_owned).collect();
    }
    raw.into_iter()
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Joins `segments` into a path, escaping each unless the first segment is
/// `localizations`.
pub fn encode_pointer<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.first().is_some_and(|s| s.as_ref() == LOCALIZATIONS) {
        let raw: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        return raw.join("/");
    }
    let escaped: Vec<String> = segments
        .iter()
        .map(|s| s.as_ref().replace('~', "~0").replace('/', "~1"))
        .collect();
    escaped.join("/")
}

fn list_index(items: &[CardValue], segment: &str, path: &str) -> Result<usize, PatchError> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|idx| *idx < items.len())
        .ok_or_else(|| PatchError::InvalidIndex {
            path: path.to_owned(),
            segment: segment.to_owned(),
            len: items.len(),
        })
}

/// Sets the value at `path` inside `target`.
///
/// Intermediate segments must exist. The last segment may name a new map
/// key, which is created, or an existing key or list index, whose value is
/// replaced.
///
/// # Errors
///
/// Returns a [`PatchError`] naming the path if it cannot be followed.
/// `target` is left unchanged in that case.
pub fn apply_patch_entry(
    target: &mut CardValue,
    path: &str,
    value: CardValue,
) -> Result<(), PatchError> {
    if path.is_empty() {
        return Err(PatchError::EmptyPath);
    }
    let segments = decode_pointer(path);
    let Some((last, parents)) = segments.split_last() else {
        return Err(PatchError::EmptyPath);
    };

    let mut node = target;
    for segment in parents {
        node = match node {
            CardValue::Object(map) => {
                map.get_mut(segment.as_str())
                    .ok_or_else(|| PatchError::MissingKey {
                        path: path.to_owned(),
                        segment: segment.clone(),
                    })?
            }
            CardValue::Array(items) => {
                let idx = list_index(items, segment, path)?;
                &mut items[idx]
            }
            CardValue::Null
            | CardValue::Bool(_)
            | CardValue::Integer(_)
            | CardValue::UnsignedInteger(_)
            | CardValue::Float(_)
            | CardValue::String(_) => {
                return Err(PatchError::NotAContainer {
                    path: path.to_owned(),
                    segment: segment.clone(),
                });
            }
        };
    }

    match node {
        CardValue::Object(map) => {
            map.insert(last.clone(), value);
        }
        CardValue::Array(items) => {
            let idx = list_index(items, last, path)?;
            items[idx] = value;
        }
        CardValue::Null
        | CardValue::Bool(_)
        | CardValue::Integer(_)
        | CardValue::UnsignedInteger(_)
        | CardValue::Float(_)
        | CardValue::String(_) => {
            return Err(PatchError::NotAContainer {
                path: path.to_owned(),
                segment: last.clone(),
            });
        }
    }
    Ok(())
}

/// Applies every entry of `patch` to `target` in path order.
///
/// A failing entry is recorded in the report and skipped; the others still
/// apply. Path order puts a key before any path beneath it, so an entry may
/// create a map that a later entry descends into.
pub fn apply_patch(target: &mut CardValue, patch: &BTreeMap<String, CardValue>) -> PatchReport {
    let mut report = PatchReport::default();
    for (path, value) in patch {
        match apply_patch_entry(target, path, value.clone()) {
            Ok(()) => report.applied += 1,
            Err(err) => report.rejected.push(err),
        }
    }
    report
}
