//! Output formatting and progress reporting

use atmoprobe::{Altitude, Check, Readout, ScenarioObserver, ScenarioReport, Severity};
use clap::ValueEnum;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::CliResult;

/// Output format for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress reporter for a smoke run
///
/// Writes styled status lines to stderr and shows a spinner while a bounded
/// wait is in progress. Failures are printed even in quiet mode.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Start a spinner for a bounded wait
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(pb);
    }

    /// Clear the spinner, if any
    pub fn finish_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("✓", "PASS", Style::new().green()), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        self.line(&self.prefix("✗", "FAIL", Style::new().red()), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("⚠", "WARN", Style::new().yellow()), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("ℹ", "INFO", Style::new().blue()), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the closing summary of a run
    pub fn summary(&self, report: &ScenarioReport) {
        let soft = report.soft_failures();
        let hard = report.hard_failures();
        let failed = !report.completed();
        if self.quiet && !failed && soft == 0 {
            return;
        }

        let passed = report.checks.iter().filter(|c| c.passed).count();
        let duration_secs = Duration::from_millis(report.elapsed_ms).as_secs_f64();
        let status = if failed { "FAILED" } else { "PASSED" };
        let status = if !self.use_color {
            status.to_string()
        } else if failed {
            style(status).red().bold().to_string()
        } else {
            style(status).green().bold().to_string()
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "{status} {} checks in {duration_secs:.2}s ({passed} passed, {soft} soft failures, {hard} hard failures)",
            report.checks.len()
        ));
    }

    fn prefix(&self, symbol: &str, plain: &str, color: Style) -> String {
        if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        }
    }

    fn line(&self, prefix: &str, message: &str) {
        let text = format!("{prefix} {message}");
        match &self.spinner {
            Some(pb) => pb.suspend(|| {
                let _ = self.term.write_line(&text);
            }),
            None => {
                let _ = self.term.write_line(&text);
            }
        }
    }
}

impl ScenarioObserver for ProgressReporter {
    fn step(&mut self, description: &str) {
        self.info(description);
    }

    fn wait_started(&mut self, what: &str, timeout: Duration) {
        self.start_spinner(&format!(
            "Waiting for {what} (up to {}ms)",
            timeout.as_millis()
        ));
    }

    fn wait_finished(&mut self, _what: &str, _elapsed: Option<Duration>) {
        self.finish_spinner();
    }

    fn check(&mut self, check: &Check) {
        let message = format!("{}: {}", check.name, check.message);
        if check.passed {
            self.success(&message);
        } else {
            let tier = match check.severity {
                Severity::Soft => "soft",
                Severity::Hard => "hard",
            };
            self.failure(&format!("{message} [{tier}]"));
        }
    }

    fn screenshot(&mut self, path: &Path) {
        self.info(&format!("Screenshot saved to {}", path.display()));
    }
}

/// Write the run report to `out` in the requested format
pub fn write_report(
    out: &mut impl Write,
    report: &ScenarioReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "url:        {}", report.url)?;
            writeln!(out, "altitude:   {} m", report.altitude)?;
            writeln!(out, "checks:     {}", report.checks.len())?;
            writeln!(out, "soft fails: {}", report.soft_failures())?;
            if let Some(path) = &report.screenshot {
                writeln!(out, "screenshot: {}", path.display())?;
            }
            if let Some(path) = &report.error_screenshot {
                writeln!(out, "error shot: {}", path.display())?;
            }
            if let Some(error) = &report.error {
                writeln!(out, "error:      {error}")?;
            }
        }
    }
    Ok(())
}

/// Write the expected readout for an altitude to `out`
pub fn write_readout(
    out: &mut impl Write,
    altitude: &Altitude,
    readout: &Readout,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "altitude": altitude.text(),
                "altitude_m": altitude.meters(),
                "readout": readout,
            });
            serde_json::to_writer_pretty(&mut *out, &value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Altitude:       {altitude}")?;
            writeln!(
                out,
                "Temperature:    {} K ({} °C)",
                readout.temperature_k, readout.temperature_c
            )?;
            writeln!(
                out,
                "Pressure:       {} hPa ({} Pa)",
                readout.pressure_hpa, readout.pressure_pa
            )?;
            writeln!(out, "Density:        {} kg/m³", readout.density)?;
            writeln!(out, "Speed of sound: {} m/s", readout.speed_of_sound)?;
        }
    }
    Ok(())
}
