//! Implementation of `cardmatch diff <expected> <observed>`.
//!
//! Parses two JSON cards, strips converter-added fields the expected card
//! does not mention, normalizes both sides and reports every difference.
//!
//! Exit codes:
//! - 0 = the cards are equivalent
//! - 1 = differences found
//! - 2 = parse failure on either file
use cardmatch_core::compare_cards;

use crate::OutputFormat;
use crate::cmd::normalize::parse_card;
use crate::error::CliError;
use crate::format::write_diff_report;

/// Runs the `diff` command.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] if either input is not JSON.
/// - [`CliError::CardsDiffer`] if the cards differ after normalization.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(expected: &str, observed: &str, format: &OutputFormat) -> Result<(), CliError> {
    let want = parse_card(expected, "expected card")?;
    let have = parse_card(observed, "observed card")?;

    let diffs = match compare_cards(&want, &have) {
        Ok(()) => Vec::new(),
        Err(mismatch) => mismatch.diffs,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_diff_report(&mut out, &diffs, format).map_err(|e| CliError::stdout(&e))?;

    if diffs.is_empty() {
        Ok(())
    } else {
        Err(CliError::CardsDiffer { paths: diffs.len() })
    }
}
