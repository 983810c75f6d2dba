//! Atmoprobe CLI: smoke-test the ISA atmosphere calculator
//!
//! ## Usage
//!
//! ```bash
//! atmoprobe run                              # Check http://localhost:3000 at 5000 m
//! atmoprobe run --altitude 11000 --presets   # Another altitude, plus the preset buttons
//! atmoprobe --format json run --no-sandbox   # JSON report, for containers
//! atmoprobe expect --altitude 5000           # Print the expected readout
//! ```

use atmoprobe_cli::{init_logging, Cli, CliConfig, CliResult, Commands, ScenarioRunner, Verbosity};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_logging(&config);

    let runner = ScenarioRunner::new(config);
    match cli.command {
        Commands::Run(args) => runner.run(&args),
        Commands::Expect(args) => runner.expect(&args, &mut std::io::stdout()),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_format(cli.format)
}
