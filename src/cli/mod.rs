//! CLI module for postline
//!
//! One subcommand per post-service operation, plus:
//! - flush: requires --yes
//! - create/update: read their JSON document from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
