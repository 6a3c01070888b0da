use std::fmt;

use serde::Serialize;

use crate::card::CardValue;

/// How the two sides differ at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Present in the expected card only.
    Missing,
    /// Present in the observed card only.
    Unexpected,
    /// Present in both with different values.
    Changed,
}

/// One difference between an expected and an observed card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDiff {
    /// Pointer path of the difference; `""` is the root.
    pub path: String,
    /// Value in the expected card, if present there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<CardValue>,
    /// Value in the observed card, if present there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<CardValue>,
}

impl CardDiff {
    pub(super) fn missing(path: String, expected: CardValue) -> Self {
        Self {
            path,
            expected: Some(expected),
            actual: None,
        }
    }

    pub(super) fn unexpected(path: String, actual: CardValue) -> Self {
        Self {
            path,
            expected: None,
            actual: Some(actual),
        }
    }

    pub(super) fn changed(path: String, expected: CardValue, actual: CardValue) -> Self {
        Self {
            path,
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    /// Classifies the difference.
    pub fn kind(&self) -> DiffKind {
        match (self.expected.is_some(), self.actual.is_some()) {
            (true, false) => DiffKind::Missing,
            (false, true) => DiffKind::Unexpected,
            (true, true) | (false, false) => DiffKind::Changed,
        }
    }
}

impl fmt::Display for CardDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match (&self.expected, &self.actual) {
            (Some(want), None) => write!(f, "{path}: missing, expected {want}"),
            (None, Some(have)) => write!(f, "{path}: unexpected {have}"),
            (Some(want), Some(have)) => write!(f, "{path}: expected {want}, got {have}"),
            (None, None) => write!(f, "{path}: differs"),
        }
    }
}

/// Two cards that differ after normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cards differ at {} path(s)", .diffs.len())]
pub struct StructuralMismatch {
    /// Every difference, in path order.
    pub diffs: Vec<CardDiff>,
}
