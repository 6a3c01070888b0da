/// Round-trip conversion scenarios.
///
/// A [`Scenario`] sends a card through a [`Converter`] to the text format,
/// checks the produced record against the scenario's patterns, converts the
/// record back and compares the recovered card with the one that was sent.
///
/// The converter is a collaborator behind a trait. [`RecordedConverter`]
/// replays previously captured converter output so scenarios can be
/// re-checked offline.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::card::{Card, CardValue};
use crate::diff::{CardDiff, compare_cards};
use crate::matcher::{MatchConfig, MatchDiagnostic, MatchTextError, PropertyPattern, match_text};

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Failure reported by a [`Converter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConverterError {
    /// The converter refused the card as invalid.
    #[error("invalid input: {details}")]
    InvalidInput {
        /// Converter-provided explanation.
        details: String,
    },
    /// The converter accepted the input but could not convert it.
    #[error("conversion failed: {details}")]
    ConversionFailed {
        /// Converter-provided explanation.
        details: String,
    },
    /// The converter could not be reached.
    #[error("transport error: {details}")]
    Transport {
        /// Description of the transport failure.
        details: String,
    },
}

/// A bidirectional card/text converter under test.
pub trait Converter {
    /// Converts a card to a text-format record.
    ///
    /// # Errors
    ///
    /// [`ConverterError::InvalidInput`] if the converter rejects the card,
    /// any other variant if conversion could not be completed.
    fn to_text(&self, card: &Card) -> Result<String, ConverterError>;

    /// Converts a text-format record to a card.
    ///
    /// # Errors
    ///
    /// Returns a [`ConverterError`] if conversion could not be completed.
    fn to_card(&self, text: &str) -> Result<Card, ConverterError>;
}

// ---------------------------------------------------------------------------
// RecordedConverter
// ---------------------------------------------------------------------------

/// Captured converter behaviour for one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Record produced for the card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Reason the converter rejected the card, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
    /// Card produced when `text` was converted back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

/// A [`Converter`] that replays [`Recording`]s keyed by card `uid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedConverter {
    by_uid: BTreeMap<String, Recording>,
}

impl RecordedConverter {
    /// An empty converter; every conversion fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the recording for `uid`.
    pub fn record(&mut self, uid: impl Into<String>, recording: Recording) {
        self.by_uid.insert(uid.into(), recording);
    }

    /// Number of recorded cards.
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

impl Converter for RecordedConverter {
    fn to_text(&self, card: &Card) -> Result<String, ConverterError> {
        let uid = card.get("uid").and_then(CardValue::as_str).unwrap_or_default();
        let recording = self
            .by_uid
            .get(uid)
            .ok_or_else(|| ConverterError::ConversionFailed {
                details: format!("no recording for uid {uid:?}"),
            })?;
        if let Some(details) = &recording.rejected {
            return Err(ConverterError::InvalidInput {
                details: details.clone(),
            });
        }
        recording
            .text
            .clone()
            .ok_or_else(|| ConverterError::ConversionFailed {
                details: format!("no record captured for uid {uid:?}"),
            })
    }

    fn to_card(&self, text: &str) -> Result<Card, ConverterError> {
        self.by_uid
            .values()
            .filter(|r| r.text.as_deref() == Some(text))
            .find_map(|r| r.card.clone())
            .ok_or_else(|| ConverterError::ConversionFailed {
                details: "no card captured for this record".to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Scenario and results
// ---------------------------------------------------------------------------

/// One round-trip check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique scenario name.
    pub id: String,
    /// Card properties to send. `@type`, `uid` and `version` are filled in
    /// when absent.
    pub card: Card,
    /// Patterns the produced record must satisfy, on top of the baseline.
    #[serde(default)]
    pub patterns: Vec<PropertyPattern>,
    /// Do not run the scenario at all.
    #[serde(default)]
    pub skip_to_text: bool,
    /// Stop after checking the produced record.
    #[serde(default)]
    pub skip_from_text: bool,
    /// Card properties the converter is expected to reject. When non-empty,
    /// the scenario succeeds only if the converter refuses the card.
    #[serde(default)]
    pub invalid_props: Vec<String>,
}

/// Outcome of one direction of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The check passed.
    Success,
    /// The converter produced output that failed the check.
    Invalid,
    /// Conversion or checking could not be completed.
    Error,
    /// The direction was not run.
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Invalid => "invalid",
            Self::Error => "error",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Why a scenario direction did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioFailure {
    /// The produced record did not satisfy the patterns.
    Mismatch {
        /// Every match problem.
        diagnostics: Vec<MatchDiagnostic>,
    },
    /// The produced record could not be read.
    Record {
        /// Parse or envelope error.
        message: String,
    },
    /// The recovered card differs from the sent card.
    Structure {
        /// Every difference.
        diffs: Vec<CardDiff>,
    },
    /// The converter failed.
    Converter {
        /// Converter error.
        message: String,
    },
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { diagnostics } => {
                for (i, d) in diagnostics.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{d}")?;
                }
                Ok(())
            }
            Self::Structure { diffs } => {
                for (i, d) in diffs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{d}")?;
                }
                Ok(())
            }
            Self::Record { message } | Self::Converter { message } => f.write_str(message),
        }
    }
}

impl From<MatchTextError> for ScenarioFailure {
    fn from(err: MatchTextError) -> Self {
        match err {
            MatchTextError::Mismatch(failure) => Self::Mismatch {
                diagnostics: failure.diagnostics,
            },
            MatchTextError::Parse(_) | MatchTextError::MissingEnvelope => Self::Record {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConverterError> for ScenarioFailure {
    fn from(err: ConverterError) -> Self {
        Self::Converter {
            message: err.to_string(),
        }
    }
}

/// Everything observed while running one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario id.
    pub scenario_id: String,
    /// The card as sent, with defaults filled in.
    pub sent_card: Card,
    /// Outcome of the card-to-text direction.
    pub to_text: Outcome,
    /// Outcome of the text-to-card direction.
    pub from_text: Outcome,
    /// Record produced by the converter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub got_text: Option<String>,
    /// Card recovered from the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub got_card: Option<Card>,
    /// Why a direction did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ScenarioFailure>,
    /// Properties the converter should have rejected but did not.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub want_invalid_props: Vec<String>,
}

impl ScenarioResult {
    fn new(scenario_id: &str, sent_card: Card) -> Self {
        Self {
            scenario_id: scenario_id.to_owned(),
            sent_card,
            to_text: Outcome::Skipped,
            from_text: Outcome::Skipped,
            got_text: None,
            got_card: None,
            failure: None,
            want_invalid_props: Vec::new(),
        }
    }

    /// The card-to-text direction succeeded and the reverse direction either
    /// succeeded or was skipped.
    pub fn is_success(&self) -> bool {
        self.to_text == Outcome::Success
            && matches!(self.from_text, Outcome::Success | Outcome::Skipped)
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Copies `card` and fills in `@type`, `uid` and `version` when absent.
fn prepare_card(card: &Card) -> Card {
    let mut card = card.clone();
    if let Some(map) = card.as_object_mut() {
        map.entry("@type".to_owned())
            .or_insert_with(|| CardValue::from("Card"));
        map.entry("uid".to_owned())
            .or_insert_with(|| CardValue::from(format!("urn:uuid:{}", uuid::Uuid::new_v4())));
        map.entry("version".to_owned())
            .or_insert_with(|| CardValue::from("1.0"));
    }
    card
}

/// Runs the card-to-text direction, recording the outcome in `result`.
fn run_to_text(
    scenario: &Scenario,
    converter: &dyn Converter,
    config: &MatchConfig,
    result: &mut ScenarioResult,
) {
    let expect_rejection = !scenario.invalid_props.is_empty();
    match converter.to_text(&result.sent_card) {
        Ok(text) => {
            if expect_rejection {
                result.to_text = Outcome::Invalid;
                result.want_invalid_props = scenario.invalid_props.clone();
            } else {
                match match_text(&text, &scenario.patterns, config) {
                    Ok(()) => result.to_text = Outcome::Success,
                    Err(err) => {
                        result.to_text = match err {
                            MatchTextError::Mismatch(_) => Outcome::Invalid,
                            MatchTextError::Parse(_) | MatchTextError::MissingEnvelope => {
                                Outcome::Error
                            }
                        };
                        result.failure = Some(err.into());
                    }
                }
            }
            result.got_text = Some(text);
        }
        Err(ConverterError::InvalidInput { .. }) if expect_rejection => {
            result.to_text = Outcome::Success;
        }
        Err(err) => {
            result.to_text = Outcome::Error;
            result.failure = Some(err.into());
        }
    }
}

/// Runs the text-to-card direction, recording the outcome in `result`.
fn run_from_text(text: &str, converter: &dyn Converter, result: &mut ScenarioResult) {
    match converter.to_card(text) {
        Ok(card) => {
            match compare_cards(&result.sent_card, &card) {
                Ok(()) => result.from_text = Outcome::Success,
                Err(mismatch) => {
                    result.from_text = Outcome::Invalid;
                    result.failure = Some(ScenarioFailure::Structure {
                        diffs: mismatch.diffs,
                    });
                }
            }
            result.got_card = Some(card);
        }
        Err(err) => {
            result.from_text = Outcome::Error;
            result.failure = Some(err.into());
        }
    }
}

/// Runs one scenario against `converter`.
///
/// Every failure is captured in the result; this function does not fail.
pub fn run_scenario(
    scenario: &Scenario,
    converter: &dyn Converter,
    config: &MatchConfig,
) -> ScenarioResult {
    let mut result = ScenarioResult::new(&scenario.id, prepare_card(&scenario.card));

    if scenario.skip_to_text {
        debug!(scenario = %scenario.id, "skipped");
        return result;
    }

    run_to_text(scenario, converter, config, &mut result);

    let proceed = result.to_text == Outcome::Success
        && scenario.invalid_props.is_empty()
        && !scenario.skip_from_text;
    if proceed {
        if let Some(text) = result.got_text.clone() {
            run_from_text(&text, converter, &mut result);
        }
    }

    info!(
        scenario = %scenario.id,
        to_text = %result.to_text,
        from_text = %result.from_text,
        "scenario finished"
    );
    result
}

/// Runs `scenarios` in id order.
pub fn run_scenarios(
    scenarios: &[Scenario],
    converter: &dyn Converter,
    config: &MatchConfig,
) -> Vec<ScenarioResult> {
    let mut ordered: Vec<&Scenario> = scenarios.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    ordered
        .into_iter()
        .map(|s| run_scenario(s, converter, config))
        .collect()
}
