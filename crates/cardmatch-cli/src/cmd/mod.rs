/// Command module for the `cardmatch` CLI.
///
/// Each submodule implements one subcommand. The `run` function in each
/// module takes the already-read inputs and parsed flags and returns
/// `Ok(())` on success or a [`crate::error::CliError`] on failure.
pub mod diff;
pub mod match_cmd;
pub mod normalize;
pub mod parse;
pub mod run;
