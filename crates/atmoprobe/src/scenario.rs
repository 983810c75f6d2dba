//! The atmosphere calculator smoke scenario.
//!
//! [`AtmosphereScenario::run`] drives a [`PageDriver`] through the calculator
//! page: load it, find the altitude input, check its accessible description,
//! type an altitude and wait for the computed temperatures. Expected strings
//! come from the [`isa`](crate::isa) model for the same altitude that is typed.
//!
//! Soft checks are recorded and the run continues. Hard checks and driver
//! errors abort: a best-effort error screenshot is taken and the original
//! error is returned inside a [`ScenarioFailure`]. The driver is closed in
//! every outcome.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::assertion::{Check, Severity};
use crate::driver::PageDriver;
use crate::isa::{Altitude, Readout, ALTITUDE_PRESETS};
use crate::locator::{Locator, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for_attached, wait_for_visible};

/// Default page address
pub const DEFAULT_URL: &str = "http://localhost:3000";
/// Default heading that marks the page as loaded
pub const DEFAULT_TITLE: &str = "Atmosphere Calculator (ISA)";
/// Default accessible label of the altitude input
pub const DEFAULT_INPUT_LABEL: &str = "Altitude (m)";
/// Default id of the input's description element
pub const DEFAULT_DESCRIPTION_ID: &str = "altitude-desc";
/// Default success screenshot
pub const DEFAULT_SCREENSHOT_PATH: &str = "verification/atmosphere_calculator_verified.png";
/// Default error screenshot
pub const DEFAULT_ERROR_SCREENSHOT_PATH: &str = "verification/error_screenshot.png";
/// Default wait for the title (10 seconds)
pub const DEFAULT_TITLE_TIMEOUT_MS: u64 = 10_000;
/// Default wait for element actions such as resolving the input (30 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;

/// Scenario configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    /// Page address
    pub url: String,
    /// Text whose appearance marks the page as loaded
    pub title: String,
    /// Accessible label of the altitude input
    pub input_label: String,
    /// Expected `aria-describedby` of the input, also the id of the description element
    pub description_id: String,
    /// Altitude typed into the input
    pub altitude: Altitude,
    /// Wait for the title in milliseconds
    pub title_timeout_ms: u64,
    /// Wait for each result string in milliseconds
    pub result_timeout_ms: u64,
    /// Wait for elements acted upon in milliseconds
    pub action_timeout_ms: u64,
    /// Polling interval for all waits in milliseconds
    pub poll_interval_ms: u64,
    /// Where the success screenshot is written
    pub screenshot_path: PathBuf,
    /// Where the screenshot of a failed run is written
    pub error_screenshot_path: PathBuf,
    /// Click every preset button and soft-check its temperature
    pub check_presets: bool,
    /// Also hard-check pressure, density and speed of sound
    pub full_readout: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            title: DEFAULT_TITLE.to_string(),
            input_label: DEFAULT_INPUT_LABEL.to_string(),
            description_id: DEFAULT_DESCRIPTION_ID.to_string(),
            altitude: Altitude::default(),
            title_timeout_ms: DEFAULT_TITLE_TIMEOUT_MS,
            result_timeout_ms: DEFAULT_TIMEOUT_MS,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            screenshot_path: PathBuf::from(DEFAULT_SCREENSHOT_PATH),
            error_screenshot_path: PathBuf::from(DEFAULT_ERROR_SCREENSHOT_PATH),
            check_presets: false,
            full_readout: false,
        }
    }
}

impl ScenarioConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page address
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the title text
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the input label
    #[must_use]
    pub fn with_input_label(mut self, label: impl Into<String>) -> Self {
        self.input_label = label.into();
        self
    }

    /// Set the description id
    #[must_use]
    pub fn with_description_id(mut self, id: impl Into<String>) -> Self {
        self.description_id = id.into();
        self
    }

    /// Set the altitude to type
    #[must_use]
    pub fn with_altitude(mut self, altitude: Altitude) -> Self {
        self.altitude = altitude;
        self
    }

    /// Set the title timeout
    #[must_use]
    pub const fn with_title_timeout(mut self, ms: u64) -> Self {
        self.title_timeout_ms = ms;
        self
    }

    /// Set the result timeout
    #[must_use]
    pub const fn with_result_timeout(mut self, ms: u64) -> Self {
        self.result_timeout_ms = ms;
        self
    }

    /// Set the action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, ms: u64) -> Self {
        self.action_timeout_ms = ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the success screenshot path
    #[must_use]
    pub fn with_screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = path.into();
        self
    }

    /// Set the error screenshot path
    #[must_use]
    pub fn with_error_screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_screenshot_path = path.into();
        self
    }

    /// Enable or disable the preset checks
    #[must_use]
    pub const fn with_presets(mut self, enabled: bool) -> Self {
        self.check_presets = enabled;
        self
    }

    /// Enable or disable the full readout checks
    #[must_use]
    pub const fn with_full_readout(mut self, enabled: bool) -> Self {
        self.full_readout = enabled;
        self
    }

    fn locator(&self, locator: Locator, timeout_ms: u64) -> Locator {
        locator
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

/// Hooks for following a run as it happens
///
/// All methods default to doing nothing.
pub trait ScenarioObserver {
    /// A step is starting
    fn step(&mut self, _description: &str) {}

    /// A bounded wait is starting
    fn wait_started(&mut self, _what: &str, _timeout: Duration) {}

    /// A bounded wait ended, `elapsed` is `None` when it timed out
    fn wait_finished(&mut self, _what: &str, _elapsed: Option<Duration>) {}

    /// A check has been decided
    fn check(&mut self, _check: &Check) {}

    /// A screenshot has been written
    fn screenshot(&mut self, _path: &Path) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScenarioObserver for NoopObserver {}

/// Everything a run observed
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Page address
    pub url: String,
    /// Altitude as typed
    pub altitude: String,
    /// Altitude in meters
    pub altitude_m: f64,
    /// Strings the page was expected to render
    pub expected: Readout,
    /// Checks in the order they ran
    pub checks: Vec<Check>,
    /// Success screenshot, when written
    pub screenshot: Option<PathBuf>,
    /// Error screenshot, when written
    pub error_screenshot: Option<PathBuf>,
    /// Error that aborted the run
    pub error: Option<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Run duration in milliseconds
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Number of failed soft checks
    #[must_use]
    pub fn soft_failures(&self) -> usize {
        self.checks.iter().filter(|c| c.is_soft_failure()).count()
    }

    /// Number of failed hard checks
    #[must_use]
    pub fn hard_failures(&self) -> usize {
        self.checks.iter().filter(|c| c.is_hard_failure()).count()
    }

    /// Whether the run completed without aborting
    #[must_use]
    pub fn completed(&self) -> bool {
        self.error.is_none() && self.hard_failures() == 0
    }

    fn record<O: ScenarioObserver + ?Sized>(&mut self, observer: &mut O, check: Check) {
        tracing::info!(
            check = %check.name,
            severity = ?check.severity,
            passed = check.passed,
            "{}",
            check.message
        );
        observer.check(&check);
        self.checks.push(check);
    }
}

/// A run that aborted, with the report gathered up to that point
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ScenarioFailure {
    /// The error that aborted the run
    #[source]
    pub error: ProbeError,
    /// Report up to the failure
    pub report: Box<ScenarioReport>,
}

/// The calculator smoke scenario
#[derive(Debug, Clone)]
pub struct AtmosphereScenario {
    config: ScenarioConfig,
    expected: Readout,
}

impl AtmosphereScenario {
    /// Prepare a scenario, computing the expected readout for the configured altitude
    pub fn new(config: ScenarioConfig) -> ProbeResult<Self> {
        let expected = config.altitude.readout()?;
        Ok(Self { config, expected })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Get the expected readout
    #[must_use]
    pub const fn expected(&self) -> &Readout {
        &self.expected
    }

    /// Run the scenario and close the driver
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioFailure`] when a hard check or a driver operation fails.
    pub async fn run<D, O>(
        &self,
        driver: &mut D,
        observer: &mut O,
    ) -> Result<ScenarioReport, ScenarioFailure>
    where
        D: PageDriver + ?Sized,
        O: ScenarioObserver + ?Sized,
    {
        let start = Instant::now();
        let mut report = ScenarioReport {
            url: self.config.url.clone(),
            altitude: self.config.altitude.text().to_string(),
            altitude_m: self.config.altitude.meters(),
            expected: self.expected.clone(),
            checks: Vec::new(),
            screenshot: None,
            error_screenshot: None,
            error: None,
            started_at: Utc::now(),
            elapsed_ms: 0,
        };

        let outcome = self.steps(driver, observer, &mut report).await;

        if let Err(error) = &outcome {
            tracing::error!(error = %error, "scenario aborted");
            self.capture_error_screenshot(driver, observer, &mut report)
                .await;
        }

        if let Err(e) = driver.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }

        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => {
                tracing::info!(
                    elapsed_ms = report.elapsed_ms,
                    soft_failures = report.soft_failures(),
                    "scenario completed"
                );
                Ok(report)
            }
            Err(error) => {
                report.error = Some(error.to_string());
                Err(ScenarioFailure {
                    error,
                    report: Box::new(report),
                })
            }
        }
    }

    async fn steps<D, O>(
        &self,
        driver: &mut D,
        observer: &mut O,
        report: &mut ScenarioReport,
    ) -> ProbeResult<()>
    where
        D: PageDriver + ?Sized,
        O: ScenarioObserver + ?Sized,
    {
        let config = &self.config;

        observer.step(&format!("Navigating to {}", config.url));
        tracing::info!(url = %config.url, "navigating");
        driver.navigate(&config.url).await?;

        observer.step(&format!("Waiting for {:?}", config.title));
        let title = config.locator(Locator::text(&config.title), config.title_timeout_ms);
        Self::expect_text(&*driver, observer, report, "title", &title)
            .await?;

        observer.step("Finding altitude input");
        let input = config.locator(Locator::label(&config.input_label), config.action_timeout_ms);
        wait_for_attached(&*driver, &input).await?;

        let described_by = driver.attribute(&input, "aria-describedby").await?;
        tracing::debug!(?described_by, "read aria-describedby");
        report.record(
            observer,
            Check::equals(
                "aria-describedby",
                Severity::Soft,
                &Some(config.description_id.clone()),
                &described_by,
            ),
        );

        let description = Locator::css(format!("#{}", config.description_id));
        let visible = driver.is_visible(&description).await?;
        report.record(
            observer,
            Check::is_true(
                "description visible",
                Severity::Soft,
                visible,
                "helper text is visible",
                "helper text is not visible",
            ),
        );

        if config.check_presets {
            self.presets(driver, observer, report).await?;
        }

        observer.step(&format!("Typing {} into altitude input", config.altitude.text()));
        driver.fill(&input, config.altitude.text()).await?;

        let expected = &self.expected;
        let mut results = vec![
            ("temperature (K)", &expected.temperature_k),
            ("temperature (°C)", &expected.temperature_c),
        ];
        if config.full_readout {
            results.extend([
                ("pressure (hPa)", &expected.pressure_hpa),
                ("density", &expected.density),
                ("speed of sound", &expected.speed_of_sound),
            ]);
        }
        observer.step(&format!("Waiting for results at {}", config.altitude));
        for (name, text) in results {
            let locator = config.locator(Locator::text(text.as_str()), config.result_timeout_ms);
            Self::expect_text(&*driver, observer, report, name, &locator)
                .await?;
        }

        observer.step("Taking screenshot");
        let shot = driver.screenshot().await?;
        shot.save(&config.screenshot_path).await?;
        tracing::info!(
            path = %config.screenshot_path.display(),
            width = shot.width,
            height = shot.height,
            "screenshot saved"
        );
        observer.screenshot(&config.screenshot_path);
        report.screenshot = Some(config.screenshot_path.clone());
        Ok(())
    }

    /// Click each preset and soft-check the Kelvin temperature it produces
    async fn presets<D, O>(
        &self,
        driver: &mut D,
        observer: &mut O,
        report: &mut ScenarioReport,
    ) -> ProbeResult<()>
    where
        D: PageDriver + ?Sized,
        O: ScenarioObserver + ?Sized,
    {
        let config = &self.config;
        for preset in &ALTITUDE_PRESETS {
            let kelvin = Altitude::parse(preset.value)?.readout()?.temperature_k;
            observer.step(&format!("Clicking preset {}", preset.label));
            let button = config.locator(Locator::label(preset.aria_label()), config.action_timeout_ms);
            wait_for_attached(&*driver, &button).await?;
            driver.click(&button).await?;

            let what = format!("preset {}", preset.label);
            let result = config.locator(Locator::text(kelvin.as_str()), config.result_timeout_ms);
            observer.wait_started(&what, result.options().timeout);
            let check = match wait_for_visible(&*driver, &result).await {
                Ok(waited) => {
                    observer.wait_finished(&what, Some(waited.elapsed));
                    Check::pass(&what, Severity::Soft, format!("shows {kelvin} K"))
                }
                Err(e) if e.is_timeout() => {
                    observer.wait_finished(&what, None);
                    Check::fail(&what, Severity::Soft, format!("{kelvin} K did not appear"))
                }
                Err(e) => return Err(e),
            };
            report.record(observer, check);
        }
        Ok(())
    }

    /// Hard check: wait for text to become visible, abort on timeout
    async fn expect_text<D, O>(
        driver: &D,
        observer: &mut O,
        report: &mut ScenarioReport,
        name: &str,
        locator: &Locator,
    ) -> ProbeResult<()>
    where
        D: PageDriver + ?Sized,
        O: ScenarioObserver + ?Sized,
    {
        observer.wait_started(name, locator.options().timeout);
        match wait_for_visible(driver, locator).await {
            Ok(waited) => {
                observer.wait_finished(name, Some(waited.elapsed));
                report.record(
                    observer,
                    Check::pass(
                        name,
                        Severity::Hard,
                        format!("found {locator} after {}ms", waited.elapsed.as_millis()),
                    ),
                );
                Ok(())
            }
            Err(error) => {
                observer.wait_finished(name, None);
                if error.is_timeout() {
                    report.record(observer, Check::fail(name, Severity::Hard, error.to_string()));
                }
                Err(error)
            }
        }
    }

    async fn capture_error_screenshot<D, O>(
        &self,
        driver: &mut D,
        observer: &mut O,
        report: &mut ScenarioReport,
    ) where
        D: PageDriver + ?Sized,
        O: ScenarioObserver + ?Sized,
    {
        let path = &self.config.error_screenshot_path;
        let saved = match driver.screenshot().await {
            Ok(shot) => shot.save(path).await,
            Err(e) => Err(e),
        };
        match saved {
            Ok(()) => {
                tracing::info!(path = %path.display(), "error screenshot saved");
                observer.screenshot(path);
                report.error_screenshot = Some(path.clone());
            }
            Err(e) => tracing::warn!(error = %e, "could not capture error screenshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    /// Renders the readout for `value` the way the calculator does
    fn render(value: &str, elements: &mut Vec<MockElement>) {
        elements.retain(|el| el.tag != "dd");
        if let Some(input) = elements.iter_mut().find(|el| el.id.as_deref() == Some("altitude")) {
            input.value = value.to_string();
        }
        let Ok(readout) = Altitude::parse(value).and_then(|a| a.readout()) else {
            elements.push(MockElement::new("p").with_text("Enter a valid altitude to see results."));
            return;
        };
        for text in [
            format!("{} K", readout.temperature_k),
            format!("{} °C", readout.temperature_c),
            format!("{} hPa", readout.pressure_hpa),
            format!("{} kg/m³", readout.density),
            format!("{} m/s", readout.speed_of_sound),
        ] {
            elements.push(MockElement::new("dd").with_text(text));
        }
    }

    fn calculator_page() -> MockDriver {
        let mut driver = MockDriver::new();
        driver.add_element(MockElement::new("h3").with_text("Atmosphere Calculator (ISA)"));
        driver.add_element(
            MockElement::new("input")
                .with_id("altitude")
                .with_label("Altitude (m)")
                .with_attribute("aria-describedby", "altitude-desc"),
        );
        driver.add_element(
            MockElement::new("p")
                .with_id("altitude-desc")
                .with_text("Enter altitude in meters."),
        );
        for preset in &ALTITUDE_PRESETS {
            driver.add_element(
                MockElement::new("button")
                    .with_text(preset.label)
                    .with_attribute("aria-label", preset.aria_label()),
            );
        }
        driver.on_fill(render);
        driver.on_click(|label, elements| {
            if let Some(preset) = ALTITUDE_PRESETS.iter().find(|p| p.aria_label() == label) {
                render(preset.value, elements);
            }
        });
        driver
    }

    fn fast_config(dir: &Path) -> ScenarioConfig {
        ScenarioConfig::default()
            .with_title_timeout(30)
            .with_result_timeout(30)
            .with_action_timeout(30)
            .with_poll_interval(1)
            .with_screenshot_path(dir.join("verified.png"))
            .with_error_screenshot_path(dir.join("error.png"))
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<String>,
        checks: Vec<Check>,
        screenshots: Vec<PathBuf>,
        waits: usize,
    }

    impl ScenarioObserver for Recorder {
        fn step(&mut self, description: &str) {
            self.steps.push(description.to_string());
        }

        fn wait_finished(&mut self, _what: &str, _elapsed: Option<Duration>) {
            self.waits += 1;
        }

        fn check(&mut self, check: &Check) {
            self.checks.push(check.clone());
        }

        fn screenshot(&mut self, path: &Path) {
            self.screenshots.push(path.to_path_buf());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults_match_calculator() {
            let config = ScenarioConfig::default();
            assert_eq!(config.url, "http://localhost:3000");
            assert_eq!(config.title, "Atmosphere Calculator (ISA)");
            assert_eq!(config.title_timeout_ms, 10_000);
            assert_eq!(config.result_timeout_ms, 5_000);
            assert_eq!(config.description_id, "altitude-desc");
            assert_eq!(config.altitude.text(), "5000");
            assert_eq!(
                config.screenshot_path,
                PathBuf::from("verification/atmosphere_calculator_verified.png")
            );
            assert_eq!(
                config.error_screenshot_path,
                PathBuf::from("verification/error_screenshot.png")
            );
            assert!(!config.check_presets);
            assert!(!config.full_readout);
        }

        #[test]
        fn test_expected_readout_follows_altitude() {
            let scenario = AtmosphereScenario::new(ScenarioConfig::default()).unwrap();
            assert_eq!(scenario.expected().temperature_k, "255.65");
            assert_eq!(scenario.expected().temperature_c, "-17.5");

            let config = ScenarioConfig::default().with_altitude(Altitude::parse("0").unwrap());
            let scenario = AtmosphereScenario::new(config).unwrap();
            assert_eq!(scenario.expected().temperature_k, "288.15");
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_success_writes_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            let mut recorder = Recorder::default();

            let report = scenario.run(&mut driver, &mut recorder).await.unwrap();

            assert!(report.completed());
            assert_eq!(report.soft_failures(), 0);
            assert!(report.checks.iter().all(|c| c.passed));
            assert_eq!(report.checks.len(), 5);
            assert_eq!(report.screenshot, Some(dir.path().join("verified.png")));
            assert!(dir.path().join("verified.png").exists());
            assert!(!dir.path().join("error.png").exists());
            assert_eq!(recorder.screenshots, vec![dir.path().join("verified.png")]);
            assert_eq!(
                driver.history(),
                &["navigate:http://localhost:3000", "fill:5000", "close"]
            );
        }

        #[tokio::test]
        async fn test_missing_title_aborts_with_error_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            driver.elements.remove(0);

            let failure = scenario
                .run(&mut driver, &mut NoopObserver)
                .await
                .unwrap_err();

            assert!(failure.error.is_timeout());
            assert_eq!(failure.report.hard_failures(), 1);
            assert!(failure.report.error.is_some());
            assert_eq!(failure.report.error_screenshot, Some(dir.path().join("error.png")));
            assert!(dir.path().join("error.png").exists());
            assert!(!driver.was_called("fill"));
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_missing_results_abort() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = MockDriver::new();
            driver.add_element(MockElement::new("h3").with_text("Atmosphere Calculator (ISA)"));
            driver.add_element(MockElement::new("input").with_label("Altitude (m)"));

            let failure = scenario
                .run(&mut driver, &mut NoopObserver)
                .await
                .unwrap_err();

            match &failure.error {
                ProbeError::Timeout { what, ms } => {
                    assert_eq!(what, "text \"255.65\"");
                    assert_eq!(*ms, 30);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(driver.was_called("fill:5000"));
            assert!(!dir.path().join("verified.png").exists());
            assert!(dir.path().join("error.png").exists());
        }

        #[tokio::test]
        async fn test_soft_failures_do_not_abort() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            driver.elements[1].attributes.clear();
            driver.elements[2].visible = false;
            let mut recorder = Recorder::default();

            let report = scenario.run(&mut driver, &mut recorder).await.unwrap();

            assert_eq!(report.soft_failures(), 2);
            assert!(report.completed());
            let described = &recorder.checks[1];
            assert_eq!(described.name, "aria-describedby");
            assert_eq!(described.message, "expected Some(\"altitude-desc\"), got None");
            assert!(dir.path().join("verified.png").exists());
        }

        #[tokio::test]
        async fn test_ambiguous_label_aborts() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            driver.add_element(MockElement::new("input").with_label("Cruise Altitude (m)"));

            let failure = scenario
                .run(&mut driver, &mut NoopObserver)
                .await
                .unwrap_err();

            assert!(matches!(
                failure.error,
                ProbeError::StrictModeViolation { count: 2, .. }
            ));
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_navigation_failure() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            driver.navigation_error = Some("net::ERR_CONNECTION_REFUSED".to_string());

            let failure = scenario
                .run(&mut driver, &mut NoopObserver)
                .await
                .unwrap_err();

            assert!(matches!(failure.error, ProbeError::Navigation { .. }));
            assert!(failure.report.checks.is_empty());
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_error_screenshot_failure_keeps_original_error() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            driver.elements.remove(0);
            driver.fail_screenshots = true;

            let failure = scenario
                .run(&mut driver, &mut NoopObserver)
                .await
                .unwrap_err();

            assert!(failure.error.is_timeout());
            assert_eq!(failure.report.error_screenshot, None);
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_custom_altitude() {
            let dir = tempfile::tempdir().unwrap();
            let config = fast_config(dir.path()).with_altitude(Altitude::parse("0").unwrap());
            let scenario = AtmosphereScenario::new(config).unwrap();
            let mut driver = calculator_page();

            let report = scenario.run(&mut driver, &mut NoopObserver).await.unwrap();

            assert_eq!(report.expected.temperature_c, "15.0");
            assert!(driver.was_called("fill:0"));
        }

        #[tokio::test]
        async fn test_presets_and_full_readout() {
            let dir = tempfile::tempdir().unwrap();
            let config = fast_config(dir.path())
                .with_presets(true)
                .with_full_readout(true);
            let scenario = AtmosphereScenario::new(config).unwrap();
            let mut driver = calculator_page();
            let mut recorder = Recorder::default();

            let report = scenario.run(&mut driver, &mut recorder).await.unwrap();

            let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(
                names,
                [
                    "title",
                    "aria-describedby",
                    "description visible",
                    "preset Sea Level",
                    "preset 1,000 m",
                    "preset 5,000 m",
                    "preset Cruise (11 km)",
                    "temperature (K)",
                    "temperature (°C)",
                    "pressure (hPa)",
                    "density",
                    "speed of sound",
                ]
            );
            assert!(report.checks.iter().all(|c| c.passed));
            assert!(driver.was_called("click:Set altitude to Cruise (11 km)"));
            assert_eq!(recorder.waits, 10);
        }

        #[tokio::test]
        async fn test_report_serializes() {
            let dir = tempfile::tempdir().unwrap();
            let scenario = AtmosphereScenario::new(fast_config(dir.path())).unwrap();
            let mut driver = calculator_page();
            let report = scenario.run(&mut driver, &mut NoopObserver).await.unwrap();

            let json = serde_json::to_value(&report).unwrap();
            assert_eq!(json["altitude"], "5000");
            assert_eq!(json["expected"]["temperature_k"], "255.65");
            assert_eq!(json["checks"][0]["severity"], "hard");
        }
    }
}
