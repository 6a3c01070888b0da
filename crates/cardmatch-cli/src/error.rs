/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `cardmatch` binary.
/// Every variant maps to a stable exit code (1 or 2) via
/// [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. The tool could not read or parse the
///   input at all, so no check ran.
/// - Exit code **1**: logical failure. The check ran to completion and
///   failed (record mismatch, cards differ, scenario failed).
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions that the `cardmatch` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// `"-"` for stdin, or the filesystem path.
        source: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes, if known (disk files only).
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        /// A human-readable label for the source.
        source: String,
        /// The byte offset of the first invalid byte sequence.
        byte_offset: usize,
    },

    /// An I/O error occurred while reading from stdin.
    StdinReadError {
        /// The underlying I/O error message.
        detail: String,
    },

    /// A generic I/O error not covered by the more specific variants above.
    IoError {
        /// A human-readable label for the source.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// Arguments that clap accepts but that cannot be combined.
    InvalidArgument {
        /// What is wrong with the arguments.
        detail: String,
    },

    /// An input is not valid JSON of the expected shape, or not a
    /// well-formed text record.
    ParseFailed {
        /// What was being parsed (`"record"`, `"patterns"`, ...).
        what: &'static str,
        /// The parser's error message.
        detail: String,
    },

    // --- Exit code 1: logical failures ---
    /// The record did not satisfy its patterns. Diagnostics have already
    /// been printed.
    MatchFailed {
        /// Number of diagnostics.
        problems: usize,
    },

    /// The cards differ after normalization. Diffs have already been printed.
    CardsDiffer {
        /// Number of differing paths.
        paths: usize,
    },

    /// At least one scenario did not succeed.
    ScenariosFailed {
        /// Scenarios that did not succeed.
        failed: usize,
        /// Scenarios run.
        total: usize,
    },
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2`: input failure (file not found, parse error, etc.).
    /// - `1`: logical failure (mismatch, difference, failed scenario).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::InvalidArgument { .. }
            | Self::ParseFailed { .. } => 2,

            Self::MatchFailed { .. } | Self::CardsDiffer { .. } | Self::ScenariosFailed { .. } => 1,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: None,
            } => {
                format!("error: file too large: {source} exceeded limit of {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::StdinReadError { detail } => {
                format!("error: failed to read stdin: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error on {source}: {detail}")
            }
            Self::InvalidArgument { detail } => format!("error: {detail}"),
            Self::ParseFailed { what, detail } => {
                format!("error: invalid {what}: {detail}")
            }
            Self::MatchFailed { problems } => {
                format!("error: record does not match: {problems} problem(s)")
            }
            Self::CardsDiffer { paths } => {
                format!("error: cards differ at {paths} path(s)")
            }
            Self::ScenariosFailed { failed, total } => {
                format!("error: {failed} of {total} scenario(s) failed")
            }
        }
    }

    /// Wraps a stdout write failure.
    pub fn stdout(e: &std::io::Error) -> Self {
        Self::IoError {
            source: "stdout".to_owned(),
            detail: e.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::path::PathBuf;

    use super::*;

    // ── exit_code ────────────────────────────────────────────────────────────

    #[test]
    fn input_failures_are_exit_2() {
        let errors = [
            CliError::FileNotFound {
                path: PathBuf::from("card.json"),
            },
            CliError::PermissionDenied {
                path: PathBuf::from("/root/card.json"),
            },
            CliError::FileTooLarge {
                source: "big.vcf".to_owned(),
                limit: 1024,
                actual: Some(2048),
            },
            CliError::InvalidUtf8 {
                source: "bad.vcf".to_owned(),
                byte_offset: 42,
            },
            CliError::StdinReadError {
                detail: "broken pipe".to_owned(),
            },
            CliError::InvalidArgument {
                detail: "both stdin".to_owned(),
            },
            CliError::ParseFailed {
                what: "record",
                detail: "line 1".to_owned(),
            },
        ];
        for e in &errors {
            assert_eq!(e.exit_code(), 2, "{e}");
        }
    }

    #[test]
    fn logical_failures_are_exit_1() {
        assert_eq!(CliError::MatchFailed { problems: 2 }.exit_code(), 1);
        assert_eq!(CliError::CardsDiffer { paths: 1 }.exit_code(), 1);
        assert_eq!(
            CliError::ScenariosFailed {
                failed: 1,
                total: 3
            }
            .exit_code(),
            1
        );
    }

    // ── message content ──────────────────────────────────────────────────────

    #[test]
    fn file_not_found_message_contains_path() {
        let e = CliError::FileNotFound {
            path: PathBuf::from("patterns.json"),
        };
        let msg = e.message();
        assert!(msg.contains("patterns.json"), "message: {msg}");
        assert!(msg.contains("not found"), "message: {msg}");
    }

    #[test]
    fn file_too_large_without_actual_mentions_limit() {
        let e = CliError::FileTooLarge {
            source: "-".to_owned(),
            limit: 512,
            actual: None,
        };
        assert!(e.message().contains("512"));
    }

    #[test]
    fn invalid_utf8_message_contains_offset() {
        let e = CliError::InvalidUtf8 {
            source: "corrupt.vcf".to_owned(),
            byte_offset: 99,
        };
        let msg = e.message();
        assert!(msg.contains("99"), "message: {msg}");
        assert!(msg.contains("corrupt.vcf"), "message: {msg}");
    }

    #[test]
    fn parse_failed_names_the_input() {
        let e = CliError::ParseFailed {
            what: "patterns",
            detail: "expected `[`".to_owned(),
        };
        assert_eq!(e.message(), "error: invalid patterns: expected `[`");
    }

    #[test]
    fn scenario_failure_counts() {
        let e = CliError::ScenariosFailed {
            failed: 2,
            total: 5,
        };
        assert_eq!(e.message(), "error: 2 of 5 scenario(s) failed");
    }

    #[test]
    fn display_matches_message() {
        let e = CliError::CardsDiffer { paths: 3 };
        assert_eq!(format!("{e}"), e.message());
    }
}
