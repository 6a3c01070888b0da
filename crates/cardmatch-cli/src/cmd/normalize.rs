//! Implementation of `cardmatch normalize <file>`.
//!
//! Reads a JSON card and prints its normalized form: defaults elided,
//! unordered components sorted, passthrough data dropped, localizations
//! expanded. Output is pretty-printed unless `--compact` is given.
use std::io::Write as _;

use cardmatch_core::{Card, normalize};

use crate::error::CliError;

/// Parses `content` as a card, reporting JSON errors as input failures.
pub(crate) fn parse_card(content: &str, what: &'static str) -> Result<Card, CliError> {
    serde_json::from_str(content).map_err(|e| CliError::ParseFailed {
        what,
        detail: e.to_string(),
    })
}

/// Runs the `normalize` command.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] if `content` is not JSON.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(content: &str, compact: bool) -> Result<(), CliError> {
    let card = parse_card(content, "card")?;
    let normalized = normalize(&card);

    let rendered = if compact {
        serde_json::to_string(&normalized)
    } else {
        serde_json::to_string_pretty(&normalized)
    }
    .map_err(|e| CliError::IoError {
        source: "stdout".to_owned(),
        detail: e.to_string(),
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{rendered}").map_err(|e| CliError::stdout(&e))
}
