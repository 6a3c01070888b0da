/// Output formatting: human-readable and JSON (NDJSON) modes.
///
/// - **Human mode** (default): one line per diagnostic, diff or scenario,
///   followed by a summary line.
/// - **JSON mode**: each item is a single-line JSON object (NDJSON),
///   followed by a `{"summary": ...}` line.
///
/// Everything here writes to a caller-supplied writer so it can be tested
/// against a buffer; the commands pass a locked stdout.
use std::io::{IsTerminal as _, Write};

use cardmatch_core::{CardDiff, MatchDiagnostic, Outcome, ScenarioResult};
use serde::Serialize;
use serde_json::json;

use crate::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted to stderr.
///
/// Colors are off when `--no-color` was passed, when `NO_COLOR` is set, or
/// when stderr is not a TTY.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Writes `value` as one line of compact JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json_line<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)
}

/// Writes each item on its own line, `Display` for human mode and JSON for
/// json mode, then a summary.
fn write_items<W, T>(
    writer: &mut W,
    items: &[T],
    format: &OutputFormat,
    summary_key: &str,
    human_summary: &str,
) -> std::io::Result<()>
where
    W: Write,
    T: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Human => {
            for item in items {
                writeln!(writer, "{item}")?;
            }
            writeln!(writer, "{human_summary}")
        }
        OutputFormat::Json => {
            for item in items {
                write_json_line(writer, item)?;
            }
            write_json_line(writer, &json!({ "summary": { summary_key: items.len() } }))
        }
    }
}

// ---------------------------------------------------------------------------
// Match reports
// ---------------------------------------------------------------------------

/// Writes the diagnostics of one match run.
///
/// Human summary: `record matches` or `2 problems`.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_match_report<W: Write>(
    writer: &mut W,
    diagnostics: &[MatchDiagnostic],
    format: &OutputFormat,
) -> std::io::Result<()> {
    let summary = if diagnostics.is_empty() {
        "record matches".to_owned()
    } else {
        let n = diagnostics.len();
        format!("{n} {}", pluralize(n, "problem", "problems"))
    };
    write_items(writer, diagnostics, format, "problems", &summary)
}

// ---------------------------------------------------------------------------
// Card diffs
// ---------------------------------------------------------------------------

/// Writes the differences between two normalized cards.
///
/// Human summary: `cards are equivalent` or `3 differences`.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_diff_report<W: Write>(
    writer: &mut W,
    diffs: &[CardDiff],
    format: &OutputFormat,
) -> std::io::Result<()> {
    let summary = if diffs.is_empty() {
        "cards are equivalent".to_owned()
    } else {
        let n = diffs.len();
        format!("{n} {}", pluralize(n, "difference", "differences"))
    };
    write_items(writer, diffs, format, "differences", &summary)
}

// ---------------------------------------------------------------------------
// Scenario results
// ---------------------------------------------------------------------------

/// Writes one scenario result.
///
/// Human format: `[ok] name  to_text=success from_text=skipped`, followed
/// by the failure detail indented by four spaces.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_scenario_result<W: Write>(
    writer: &mut W,
    result: &ScenarioResult,
    format: &OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => {
            let tag = if result.is_success() {
                "[ok]"
            } else if result.to_text == Outcome::Skipped {
                "[skip]"
            } else {
                "[FAIL]"
            };
            writeln!(
                writer,
                "{tag} {}  to_text={} from_text={}",
                result.scenario_id, result.to_text, result.from_text
            )?;
            if !result.want_invalid_props.is_empty() {
                writeln!(
                    writer,
                    "    converter accepted invalid properties: {}",
                    result.want_invalid_props.join(", ")
                )?;
            }
            if let Some(failure) = &result.failure {
                for line in failure.to_string().lines() {
                    writeln!(writer, "    {line}")?;
                }
            }
            Ok(())
        }
        OutputFormat::Json => write_json_line(writer, result),
    }
}

/// Writes the summary after all scenarios ran.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_scenario_summary<W: Write>(
    writer: &mut W,
    passed: usize,
    failed: usize,
    skipped: usize,
    format: &OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{passed} passed, {failed} failed, {skipped} skipped")
        }
        OutputFormat::Json => write_json_line(
            writer,
            &json!({ "summary": { "passed": passed, "failed": failed, "skipped": skipped } }),
        ),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use cardmatch_core::{MatchConfig, MatchTextError, match_text};

    use super::*;

    fn diagnostics(text: &str) -> Vec<MatchDiagnostic> {
        match match_text(text, &[], &MatchConfig::default()) {
            Ok(()) => Vec::new(),
            Err(MatchTextError::Mismatch(failure)) => failure.diagnostics,
            Err(e @ (MatchTextError::Parse(_) | MatchTextError::MissingEnvelope)) => {
                panic!("record should parse: {e}")
            }
        }
    }

    fn capture(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).expect("write to buffer");
        String::from_utf8(buf).expect("utf8")
    }

    const EXTRA: &str = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:J\r\nUID:x\r\nX-FOO:bar\r\nEND:VCARD\r\n";

    #[test]
    fn human_match_report_lists_problems_and_summary() {
        let diags = diagnostics(EXTRA);
        let out = capture(|w| write_match_report(w, &diags, &OutputFormat::Human));
        assert_eq!(out, "unexpected property X-FOO:bar\n1 problem\n");
    }

    #[test]
    fn human_match_report_for_clean_record() {
        let out = capture(|w| write_match_report(w, &[], &OutputFormat::Human));
        assert_eq!(out, "record matches\n");
    }

    #[test]
    fn json_match_report_is_ndjson() {
        let diags = diagnostics(EXTRA);
        let out = capture(|w| write_match_report(w, &diags, &OutputFormat::Json));
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("each line is JSON"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "unexpected");
        assert_eq!(lines[0]["property"]["name"], "X-FOO");
        assert_eq!(lines[1]["summary"]["problems"], 1);
    }

    #[test]
    fn diff_report_pluralizes() {
        let want = serde_json::from_str(r#"{"a": 1, "b": 2}"#).expect("json");
        let have = serde_json::from_str(r#"{"a": 2}"#).expect("json");
        let diffs = cardmatch_core::diff_values(&want, &have);
        let out = capture(|w| write_diff_report(w, &diffs, &OutputFormat::Human));
        assert!(out.ends_with("2 differences\n"), "out: {out}");
        assert!(out.contains("a: expected 1, got 2"), "out: {out}");
    }

    #[test]
    fn scenario_summary_json() {
        let out = capture(|w| write_scenario_summary(w, 2, 1, 0, &OutputFormat::Json));
        let v: serde_json::Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(v["summary"]["failed"], 1);
        assert_eq!(v["summary"]["skipped"], 0);
    }

    #[test]
    fn scenario_summary_human() {
        let out = capture(|w| write_scenario_summary(w, 1, 0, 2, &OutputFormat::Human));
        assert_eq!(out, "1 passed, 0 failed, 2 skipped\n");
    }
}
