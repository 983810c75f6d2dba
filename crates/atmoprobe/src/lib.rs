//! Atmoprobe: headless-browser smoke check for the ISA atmosphere calculator
//!
//! Loads the calculator page in Chromium, checks the altitude input's
//! accessible description, types an altitude and waits for the temperatures
//! the International Standard Atmosphere predicts for it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   ATMOPROBE Architecture                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐         │
//! │   │ isa        │    │ Scenario   │    │ PageDriver │         │
//! │   │ (expected  │───►│ (soft/hard │───►│ (chromium  │         │
//! │   │  readout)  │    │  checks)   │    │  or mock)  │         │
//! │   └────────────┘    └────────────┘    └────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use atmoprobe::{AtmosphereScenario, BrowserConfig, ChromiumDriver, NoopObserver, ScenarioConfig};
//!
//! let scenario = AtmosphereScenario::new(ScenarioConfig::default())?;
//! let mut driver = ChromiumDriver::launch(BrowserConfig::default()).await?;
//! let report = scenario.run(&mut driver, &mut NoopObserver).await?;
//! println!("{} soft failures", report.soft_failures());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod browser;
mod driver;
pub mod isa;
mod locator;
mod result;
mod scenario;
mod wait;

pub use assertion::{Check, Severity};
pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use driver::{MockDriver, MockElement, PageDriver, Screenshot};
pub use isa::{parse_altitude, standard_atmosphere, to_fixed, Altitude, Atmosphere, Readout};
pub use locator::{Locator, LocatorOptions, Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{
    AtmosphereScenario, NoopObserver, ScenarioConfig, ScenarioFailure, ScenarioObserver,
    ScenarioReport, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_DESCRIPTION_ID,
    DEFAULT_ERROR_SCREENSHOT_PATH, DEFAULT_INPUT_LABEL, DEFAULT_SCREENSHOT_PATH, DEFAULT_TITLE,
    DEFAULT_TITLE_TIMEOUT_MS, DEFAULT_URL,
};
pub use wait::{wait_for_attached, wait_for_visible, wait_until, WaitOptions, WaitResult};
