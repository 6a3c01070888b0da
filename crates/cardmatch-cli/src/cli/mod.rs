//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
///
/// Parsing `"-"` yields [`PathOrStdin::Stdin`]; anything else yields
/// [`PathOrStdin::Path`].
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// Output format for CLI commands.
///
/// `Human` emits plain text to stdout. `Json` emits NDJSON for diagnostics
/// and diffs, and a single JSON document for cards and records.
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default).
    Human,
    /// Structured JSON / NDJSON output.
    Json,
}

/// All top-level subcommands exposed by the `cardmatch` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Parse a text record and print it in canonical order.
    Parse {
        /// Path to a record file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Print properties in payload order instead of canonical order.
        #[arg(long)]
        keep_order: bool,
    },

    /// Match a text record against a pattern file.
    Match {
        /// Path to a record file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// JSON array of property patterns the record must satisfy.
        ///
        /// Without it only the baseline patterns apply.
        #[arg(long, value_name = "PATTERNS")]
        expect: Option<PathBuf>,
        /// Do not add the baseline patterns for UID, VERSION, FN and friends.
        #[arg(long)]
        no_baseline: bool,
    },

    /// Print the normalized form of a JSON card.
    Normalize {
        /// Path to a card file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Emit minified JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Compare an expected card with an observed one after normalization.
    Diff {
        /// Path to the expected card, or `-` for stdin.
        #[arg(value_name = "EXPECTED")]
        expected: PathOrStdin,
        /// Path to the observed card (cannot be `-` if EXPECTED is `-`).
        #[arg(value_name = "OBSERVED")]
        observed: PathOrStdin,
    },

    /// Replay a scenario file against recorded converter output.
    Run {
        /// JSON array of scenarios, or `-` for stdin.
        #[arg(value_name = "SCENARIOS")]
        scenarios: PathOrStdin,
        /// JSON object of recordings keyed by card uid.
        #[arg(long, value_name = "FILE")]
        recordings: PathBuf,
        /// Run only the scenario with this id (repeatable).
        #[arg(long, value_name = "ID")]
        only: Vec<String>,
    },
}

/// Root CLI struct for the `cardmatch` binary.
///
/// All global flags are defined here and marked `global = true` so that clap
/// propagates them to every subcommand.
#[derive(Parser)]
#[command(
    name = "cardmatch",
    version,
    about = "Contact-card conversion conformance checker",
    long_about = "Checks the output of a contact-card converter.\n\
                  Parses and matches text records against expected property\n\
                  patterns, normalizes and compares JSON cards, and replays\n\
                  recorded round-trip scenarios."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(
        long,
        short = 'f',
        default_value = "human",
        global = true,
        env = "CARDMATCH_FORMAT"
    )]
    pub format: OutputFormat,

    /// Only log errors (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every match decision (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log filter directive, e.g. `info` or `cardmatch_core=debug`.
    #[arg(long, global = true, env = "CARDMATCH_LOG", default_value = "warn")]
    pub log_level: String,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `CARDMATCH_MAX_FILE_SIZE` environment
    /// variable. The CLI flag takes precedence over the environment variable.
    /// Default: 67108864 (64 MiB).
    #[arg(
        long,
        global = true,
        env = "CARDMATCH_MAX_FILE_SIZE",
        default_value = "67108864"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in log output.
    ///
    /// Also respects the `NO_COLOR` environment variable per
    /// <https://no-color.org>.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}
