//! Implementation of `cardmatch parse <file>`.
//!
//! Parses a text record and writes it back out, in canonical order unless
//! `--keep-order` is given. Human mode prints content lines; JSON mode
//! prints the property list as one JSON array.
//!
//! Exit codes:
//! - 0 = the record parsed
//! - 2 = the record is malformed
use std::io::Write as _;

use cardmatch_core::{canonicalize, parse_record};
use tracing::debug;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::write_json_line;

/// Runs the `parse` command.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] if `content` is not a well-formed record.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(content: &str, keep_order: bool, format: &OutputFormat) -> Result<(), CliError> {
    let parsed = parse_record(content).map_err(|e| CliError::ParseFailed {
        what: "record",
        detail: e.to_string(),
    })?;
    debug!(properties = parsed.len(), "record parsed");

    let record = if keep_order {
        parsed
    } else {
        canonicalize(&parsed).into_record()
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Human => write!(out, "{record}"),
        OutputFormat::Json => write_json_line(&mut out, &record),
    }
    .map_err(|e| CliError::stdout(&e))
}
