//! Implementation of `cardmatch run <scenarios> --recordings <file>`.
//!
//! Replays each scenario against the recorded converter output: the
//! recorded record is matched against the scenario's patterns, and the
//! recorded card is compared with the card that was sent. One line (or one
//! JSON object) per scenario, then a summary.
//!
//! Scenarios replayed this way must declare their `uid` in the card, since
//! recordings are keyed by it.
//!
//! Scenarios marked `skip_to_text` are reported as skipped and do not fail
//! the run.
//!
//! Exit codes:
//! - 0 = every scenario that ran succeeded
//! - 1 = at least one scenario failed
//! - 2 = the scenario or recording file is malformed
use cardmatch_core::{MatchConfig, Outcome, RecordedConverter, Scenario, run_scenarios};
use tracing::{info, warn};

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{write_scenario_result, write_scenario_summary};

/// Runs the `run` command.
///
/// When `only` is non-empty, scenarios whose id is not listed are dropped
/// before running; an id that names no scenario is logged and ignored.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] if either file is malformed.
/// - [`CliError::ScenariosFailed`] if any scenario did not succeed.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(
    scenarios: &str,
    recordings: &str,
    only: &[String],
    format: &OutputFormat,
) -> Result<(), CliError> {
    let mut scenarios: Vec<Scenario> =
        serde_json::from_str(scenarios).map_err(|e| CliError::ParseFailed {
            what: "scenarios",
            detail: e.to_string(),
        })?;
    let converter: RecordedConverter =
        serde_json::from_str(recordings).map_err(|e| CliError::ParseFailed {
            what: "recordings",
            detail: e.to_string(),
        })?;

    if !only.is_empty() {
        for id in only {
            if !scenarios.iter().any(|s| &s.id == id) {
                warn!(scenario = %id, "no scenario with this id");
            }
        }
        scenarios.retain(|s| only.contains(&s.id));
    }
    info!(
        scenarios = scenarios.len(),
        recordings = converter.len(),
        "replaying scenarios"
    );

    let results = run_scenarios(&scenarios, &converter, &MatchConfig::default());
    let passed = results.iter().filter(|r| r.is_success()).count();
    let skipped = results
        .iter()
        .filter(|r| r.to_text == Outcome::Skipped)
        .count();
    let failed = results.len() - passed - skipped;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &results {
        write_scenario_result(&mut out, result, format).map_err(|e| CliError::stdout(&e))?;
    }
    write_scenario_summary(&mut out, passed, failed, skipped, format)
        .map_err(|e| CliError::stdout(&e))?;

    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed,
            total: results.len(),
        })
    }
}
