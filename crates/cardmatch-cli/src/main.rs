mod cli;
mod cmd;
mod error;
mod format;
mod io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Command, OutputFormat, PathOrStdin};
use error::CliError;

/// Installs the stderr subscriber. `--verbose` and `--quiet` override the
/// configured level.
fn init_tracing(cli: &Cli) {
    let directive = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(format::colors_enabled(cli.no_color))
        .with_target(false)
        .init();
}

fn dispatch(cli: &Cli) -> Result<(), CliError> {
    let max = cli.max_file_size;
    match &cli.command {
        Command::Parse { file, keep_order } => {
            let content = io::read_input(file, max)?;
            cmd::parse::run(&content, *keep_order, &cli.format)
        }
        Command::Match {
            file,
            expect,
            no_baseline,
        } => {
            let content = io::read_input(file, max)?;
            let patterns = match expect {
                Some(path) => Some(io::read_input(&PathOrStdin::Path(path.clone()), max)?),
                None => None,
            };
            cmd::match_cmd::run(&content, patterns.as_deref(), *no_baseline, &cli.format)
        }
        Command::Normalize { file, compact } => {
            let content = io::read_input(file, max)?;
            cmd::normalize::run(&content, *compact)
        }
        Command::Diff { expected, observed } => {
            if matches!((expected, observed), (PathOrStdin::Stdin, PathOrStdin::Stdin)) {
                return Err(CliError::InvalidArgument {
                    detail: "at most one of EXPECTED and OBSERVED may be `-`".to_owned(),
                });
            }
            let want = io::read_input(expected, max)?;
            let have = io::read_input(observed, max)?;
            cmd::diff::run(&want, &have, &cli.format)
        }
        Command::Run {
            scenarios,
            recordings,
            only,
        } => {
            let scenarios = io::read_input(scenarios, max)?;
            let recordings = io::read_input(&PathOrStdin::Path(recordings.clone()), max)?;
            cmd::run::run(&scenarios, &recordings, only, &cli.format)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = dispatch(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}
