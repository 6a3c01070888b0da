//! Implementation of `cardmatch match <file> [--expect PATTERNS]`.
//!
//! Parses a text record, checks it against the property patterns in
//! `PATTERNS` (plus the baseline unless `--no-baseline`), and prints every
//! diagnostic followed by a summary.
//!
//! Exit codes:
//! - 0 = every property was accepted and every mandatory pattern consumed
//! - 1 = the record does not match
//! - 2 = the record, its envelope or the pattern file is malformed
use cardmatch_core::{MatchConfig, MatchTextError, PropertyPattern, match_text};
use tracing::info;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::write_match_report;

/// Parses a JSON array of property patterns.
pub(crate) fn parse_patterns(content: &str) -> Result<Vec<PropertyPattern>, CliError> {
    serde_json::from_str(content).map_err(|e| CliError::ParseFailed {
        what: "patterns",
        detail: e.to_string(),
    })
}

/// Runs the `match` command.
///
/// `patterns` is the content of the `--expect` file, if one was given.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] if the record or the patterns are malformed,
///   or the record lacks its `BEGIN`/`END` envelope.
/// - [`CliError::MatchFailed`] if the record does not match.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(
    content: &str,
    patterns: Option<&str>,
    no_baseline: bool,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let patterns = match patterns {
        Some(text) => parse_patterns(text)?,
        None => Vec::new(),
    };
    let config = if no_baseline {
        MatchConfig::without_baseline()
    } else {
        MatchConfig::default()
    };
    info!(patterns = patterns.len(), baseline = !no_baseline, "matching record");

    let diagnostics = match match_text(content, &patterns, &config) {
        Ok(()) => Vec::new(),
        Err(MatchTextError::Mismatch(failure)) => failure.diagnostics,
        Err(e @ (MatchTextError::Parse(_) | MatchTextError::MissingEnvelope)) => {
            return Err(CliError::ParseFailed {
                what: "record",
                detail: e.to_string(),
            });
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_match_report(&mut out, &diagnostics, format).map_err(|e| CliError::stdout(&e))?;

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(CliError::MatchFailed {
            problems: diagnostics.len(),
        })
    }
}
