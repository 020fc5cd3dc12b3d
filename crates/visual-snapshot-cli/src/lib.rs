//! vsnap: command-line front end for visual snapshot comparison
//!
//! `vsnap compare` runs the full baseline flow for one screenshot;
//! `vsnap diff` compares two image files directly.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{Cli, ColorArg, Commands, CompareArgs, DiffArgs, PolicyArg};
pub use config::{CliConfig, ColorChoice, FileConfig, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{describe, print_json, Reporter};
