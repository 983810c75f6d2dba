//! Atmoprobe CLI Library
//!
//! Command-line interface for the atmosphere calculator smoke check.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ExpectArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity, Viewport};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{write_readout, write_report, OutputFormat, ProgressReporter};
pub use runner::ScenarioRunner;
