//! CLI command definitions using clap

use atmoprobe::Altitude;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Viewport;
use crate::output::OutputFormat;

/// Atmoprobe: smoke-test the ISA atmosphere calculator in headless Chromium
#[derive(Parser, Debug)]
#[command(name = "atmoprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Report format on stdout
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the smoke check against a live calculator page
    Run(RunArgs),

    /// Print the readout the calculator should show for an altitude
    Expect(ExpectArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Page address
    #[arg(long, default_value = atmoprobe::DEFAULT_URL)]
    pub url: String,

    /// Altitude in meters to type into the input
    #[arg(long, default_value = "5000", allow_hyphen_values = true)]
    pub altitude: Altitude,

    /// Text that marks the page as loaded
    #[arg(long, default_value = atmoprobe::DEFAULT_TITLE)]
    pub title: String,

    /// Accessible label of the altitude input
    #[arg(long, default_value = atmoprobe::DEFAULT_INPUT_LABEL)]
    pub label: String,

    /// Expected aria-describedby of the input (also the helper text id)
    #[arg(long, default_value = atmoprobe::DEFAULT_DESCRIPTION_ID)]
    pub describedby: String,

    /// Wait for the title in milliseconds
    #[arg(long, default_value_t = atmoprobe::DEFAULT_TITLE_TIMEOUT_MS)]
    pub title_timeout: u64,

    /// Wait for each result in milliseconds
    #[arg(long, default_value_t = atmoprobe::DEFAULT_TIMEOUT_MS)]
    pub result_timeout: u64,

    /// Wait for elements acted upon in milliseconds
    #[arg(long, default_value_t = atmoprobe::DEFAULT_ACTION_TIMEOUT_MS)]
    pub action_timeout: u64,

    /// Polling interval for waits in milliseconds
    #[arg(long, default_value_t = atmoprobe::DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval: u64,

    /// Success screenshot path
    #[arg(long, default_value = atmoprobe::DEFAULT_SCREENSHOT_PATH)]
    pub screenshot: PathBuf,

    /// Error screenshot path
    #[arg(long, default_value = atmoprobe::DEFAULT_ERROR_SCREENSHOT_PATH)]
    pub error_screenshot: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the Chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    pub viewport: Viewport,

    /// Click each altitude preset and check its temperature
    #[arg(long)]
    pub presets: bool,

    /// Also check pressure, density and speed of sound
    #[arg(long)]
    pub full_readout: bool,

    /// Exit non-zero when a soft check fails
    #[arg(long)]
    pub fail_on_soft: bool,
}

/// Arguments for the expect command
#[derive(Parser, Debug, Clone)]
pub struct ExpectArgs {
    /// Altitude in meters
    #[arg(long, default_value = "5000", allow_hyphen_values = true)]
    pub altitude: Altitude,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
