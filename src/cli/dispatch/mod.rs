//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{ARG_GATE_LIST, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let gate_list = matches.get_one::<String>(ARG_GATE_LIST).cloned();

    Ok(Action::Server(Args { port, gate_list }))
}
