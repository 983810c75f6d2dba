//! Smoke run execution

use atmoprobe::{AtmosphereScenario, PageDriver, ScenarioReport};
use std::io::Write;

use crate::commands::{ExpectArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{write_readout, write_report, OutputFormat, ProgressReporter};

/// Runs the calculator smoke check and reports the outcome
#[derive(Debug)]
pub struct ScenarioRunner {
    config: CliConfig,
}

impl ScenarioRunner {
    /// Create a new runner
    #[must_use]
    pub const fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    fn reporter(&self) -> ProgressReporter {
        ProgressReporter::new(
            self.config.color.should_color(),
            self.config.verbosity.is_quiet(),
        )
    }

    /// Launch Chromium and run the smoke check
    #[cfg(feature = "browser")]
    pub fn run(&self, args: &RunArgs) -> CliResult<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let browser = args.browser_config();
            tracing::debug!(?browser, "launching chromium");
            let mut driver = atmoprobe::ChromiumDriver::launch(browser).await?;
            self.run_with_driver(args, &mut driver, &mut std::io::stdout())
                .await
                .map(|_| ())
        })
    }

    /// Without browser support the check cannot run
    #[cfg(not(feature = "browser"))]
    pub fn run(&self, _args: &RunArgs) -> CliResult<()> {
        Err(CliError::config(
            "browser support not compiled in; rebuild with --features browser",
        ))
    }

    /// Run the smoke check against an already opened driver
    ///
    /// The report is written to `out` whether or not the run aborted. The
    /// driver is closed when this returns.
    pub async fn run_with_driver<D>(
        &self,
        args: &RunArgs,
        driver: &mut D,
        out: &mut impl Write,
    ) -> CliResult<ScenarioReport>
    where
        D: PageDriver + ?Sized,
    {
        let scenario = AtmosphereScenario::new(args.scenario_config())?;
        let mut reporter = self.reporter();
        reporter.header(&format!(
            "Atmosphere calculator at {} ({})",
            args.url, args.altitude
        ));
        if self.config.verbosity.is_verbose() {
            let expected = scenario.expected();
            reporter.info(&format!(
                "Expecting {} K and {} °C",
                expected.temperature_k, expected.temperature_c
            ));
        }

        let outcome = scenario.run(driver, &mut reporter).await;
        reporter.finish_spinner();

        match outcome {
            Ok(report) => {
                reporter.summary(&report);
                self.emit(out, &report)?;
                let soft = report.soft_failures();
                if soft > 0 {
                    if args.fail_on_soft {
                        return Err(CliError::SoftFailures { count: soft });
                    }
                    reporter.warning(&format!("{soft} soft check(s) failed"));
                }
                Ok(report)
            }
            Err(failure) => {
                reporter.summary(&failure.report);
                self.emit(out, &failure.report)?;
                Err(failure.into())
            }
        }
    }

    /// Print the readout expected for an altitude
    pub fn expect(&self, args: &ExpectArgs, out: &mut impl Write) -> CliResult<()> {
        let readout = args.altitude.readout()?;
        write_readout(out, &args.altitude, &readout, self.config.format)
    }

    fn emit(&self, out: &mut impl Write, report: &ScenarioReport) -> CliResult<()> {
        // Text mode already printed everything to stderr unless quiet.
        if self.config.format == OutputFormat::Text && !self.config.verbosity.is_quiet() {
            return Ok(());
        }
        write_report(out, report, self.config.format)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use crate::config::Verbosity;
    use atmoprobe::{Altitude, MockDriver, MockElement};
    use clap::Parser;
    use std::path::Path;

    fn run_args(dir: &Path, extra: &[&str]) -> RunArgs {
        let screenshot = dir.join("ok.png");
        let error_screenshot = dir.join("error.png");
        let mut argv = vec![
            "atmoprobe".to_string(),
            "run".to_string(),
            "--title-timeout".to_string(),
            "30".to_string(),
            "--result-timeout".to_string(),
            "30".to_string(),
            "--action-timeout".to_string(),
            "30".to_string(),
            "--poll-interval".to_string(),
            "1".to_string(),
            "--screenshot".to_string(),
            screenshot.display().to_string(),
            "--error-screenshot".to_string(),
            error_screenshot.display().to_string(),
        ];
        argv.extend(extra.iter().map(ToString::to_string));
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            Commands::Expect(_) => panic!("expected Run command"),
        }
    }

    fn calculator(describedby: Option<&str>) -> MockDriver {
        let mut driver = MockDriver::new();
        driver.add_element(MockElement::new("h3").with_text("Atmosphere Calculator (ISA)"));
        let mut input = MockElement::new("input").with_label("Altitude (m)");
        if let Some(id) = describedby {
            input = input.with_attribute("aria-describedby", id);
        }
        driver.add_element(input);
        driver.add_element(MockElement::new("p").with_id("altitude-desc"));
        driver.on_fill(|value, elements| {
            if let Ok(readout) = Altitude::parse(value).and_then(|a| a.readout()) {
                elements.push(MockElement::new("dd").with_text(format!("{} K", readout.temperature_k)));
                elements.push(MockElement::new("dd").with_text(format!("{} °C", readout.temperature_c)));
            }
        });
        driver
    }

    fn json_runner() -> ScenarioRunner {
        ScenarioRunner::new(
            CliConfig::new()
                .with_verbosity(Verbosity::Quiet)
                .with_format(OutputFormat::Json),
        )
    }

    #[tokio::test]
    async fn test_success_emits_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path(), &[]);
        let mut driver = calculator(Some("altitude-desc"));
        let mut out = Vec::new();

        let report = json_runner()
            .run_with_driver(&args, &mut driver, &mut out)
            .await
            .unwrap();

        assert!(report.completed());
        assert!(dir.path().join("ok.png").exists());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["expected"]["temperature_k"], "255.65");
        assert_eq!(value["error"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_soft_failure_passes_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path(), &[]);
        let mut driver = calculator(None);

        let report = json_runner()
            .run_with_driver(&args, &mut driver, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(report.soft_failures(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_soft() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path(), &["--fail-on-soft"]);
        let mut driver = calculator(Some("wrong-id"));

        let err = json_runner()
            .run_with_driver(&args, &mut driver, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::SoftFailures { count: 1 }));
    }

    #[tokio::test]
    async fn test_abort_still_emits_report() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path(), &["--title", "Range Calculator"]);
        let mut driver = calculator(Some("altitude-desc"));
        let mut out = Vec::new();

        let err = json_runner()
            .run_with_driver(&args, &mut driver, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Scenario(_)));
        assert!(dir.path().join("error.png").exists());
        assert!(driver.is_closed());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(value["error"].as_str().unwrap().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_text_mode_writes_nothing_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path(), &[]);
        let mut driver = calculator(Some("altitude-desc"));
        let mut out = Vec::new();
        let runner = ScenarioRunner::new(CliConfig::new().with_color(crate::ColorChoice::Never));

        runner
            .run_with_driver(&args, &mut driver, &mut out)
            .await
            .unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_expect_text() {
        let runner = ScenarioRunner::new(CliConfig::new());
        let args = ExpectArgs {
            altitude: Altitude::parse("11000").unwrap(),
        };
        let mut out = Vec::new();
        runner.expect(&args, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("216.65 K (-56.5 °C)"));
    }
}
