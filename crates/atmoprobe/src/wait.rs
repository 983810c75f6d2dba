//! Bounded waits.
//!
//! Every wait polls a probe until it reports success or the timeout elapses;
//! nothing waits unbounded. The probe always runs at least once, so a zero
//! timeout degrades to a single check.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::driver::PageDriver;
use crate::locator::{Locator, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{ProbeError, ProbeResult};

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Options matching a locator's auto-wait settings
    #[must_use]
    pub fn for_locator(locator: &Locator) -> Self {
        Self {
            timeout_ms: locator.options().timeout.as_millis() as u64,
            poll_interval_ms: locator.options().poll_interval.as_millis() as u64,
        }
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
}

/// Poll `probe` until it yields `Some`, or fail with [`ProbeError::Timeout`].
///
/// Errors returned by the probe abort the wait immediately.
pub async fn wait_until<T, F, Fut>(
    options: &WaitOptions,
    what: &str,
    mut probe: F,
) -> ProbeResult<(T, WaitResult)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    loop {
        if let Some(value) = probe().await? {
            let result = WaitResult {
                elapsed: start.elapsed(),
            };
            return Ok((value, result));
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ProbeError::Timeout {
                what: what.to_string(),
                ms: options.timeout_ms,
            });
        }
        let remaining = timeout - elapsed;
        tokio::time::sleep(options.poll_interval().min(remaining)).await;
    }
}

/// Wait until the located element is attached to the page
pub async fn wait_for_attached<D>(driver: &D, locator: &Locator) -> ProbeResult<WaitResult>
where
    D: PageDriver + ?Sized,
{
    let options = WaitOptions::for_locator(locator);
    let what = locator.to_string();
    let ((), result) = wait_until(&options, &what, || async move {
        let count = driver.count(locator.selector()).await?;
        if count == 0 {
            return Ok(None);
        }
        locator.check_count(count)?;
        Ok(Some(()))
    })
    .await?;
    Ok(result)
}

/// Wait until the located element is visible
pub async fn wait_for_visible<D>(driver: &D, locator: &Locator) -> ProbeResult<WaitResult>
where
    D: PageDriver + ?Sized,
{
    let options = WaitOptions::for_locator(locator);
    let what = locator.to_string();
    let ((), result) = wait_until(&options, &what, || async move {
        Ok(driver.is_visible(locator).await?.then_some(()))
    })
    .await?;
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_chained() {
            let opts = WaitOptions::new().with_timeout(10_000).with_poll_interval(20);
            assert_eq!(opts.timeout(), Duration::from_secs(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(20));
        }

        #[test]
        fn test_for_locator() {
            let loc = Locator::text("x")
                .with_timeout(Duration::from_millis(1234))
                .with_poll_interval(Duration::from_millis(7));
            let opts = WaitOptions::for_locator(&loc);
            assert_eq!(opts.timeout_ms, 1234);
            assert_eq!(opts.poll_interval_ms, 7);
        }
    }

    mod wait_until_tests {
        use super::*;

        #[tokio::test]
        async fn test_immediate_success() {
            let (value, result) = wait_until(&WaitOptions::new(), "answer", || async {
                Ok(Some(42))
            })
            .await
            .unwrap();
            assert_eq!(value, 42);
            assert!(result.elapsed < Duration::from_secs(1));
        }

        #[tokio::test]
        async fn test_success_after_polls() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(1000).with_poll_interval(1);
            let (value, _) = wait_until(&opts, "third call", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok((n >= 3).then_some(n)) }
            })
            .await
            .unwrap();
            assert_eq!(value, 3);
        }

        #[tokio::test]
        async fn test_timeout() {
            let opts = WaitOptions::new().with_timeout(30).with_poll_interval(5);
            let err = wait_until(&opts, "never", || async { Ok(None::<()>) })
                .await
                .unwrap_err();
            match err {
                ProbeError::Timeout { what, ms } => {
                    assert_eq!(what, "never");
                    assert_eq!(ms, 30);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_zero_timeout_checks_once() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(0);
            let result = wait_until(&opts, "once", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None::<()>) }
            })
            .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_probe_error_aborts() {
            let err = wait_until(&WaitOptions::new(), "broken", || async {
                Err::<Option<()>, _>(ProbeError::page("detached"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::Page { .. }));
        }
    }

    mod locator_wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_visible_text() {
            let mut driver = MockDriver::new();
            driver.add_element(MockElement::new("h3").with_text("Atmosphere Calculator (ISA)"));
            let loc = Locator::text("Atmosphere Calculator (ISA)");
            assert!(wait_for_visible(&driver, &loc).await.is_ok());
        }

        #[tokio::test]
        async fn test_wait_for_visible_hidden_times_out() {
            let mut driver = MockDriver::new();
            driver.add_element(
                MockElement::new("p")
                    .with_text("255.65")
                    .with_visible(false),
            );
            let loc = Locator::text("255.65").with_timeout(Duration::from_millis(20));
            let err = wait_for_visible(&driver, &loc).await.unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test]
        async fn test_wait_for_attached_strict() {
            let mut driver = MockDriver::new();
            driver.add_element(MockElement::new("input").with_label("Altitude (m)"));
            driver.add_element(MockElement::new("input").with_label("Cruise Altitude (m)"));
            let err = wait_for_attached(&driver, &Locator::label("Altitude (m)"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::StrictModeViolation { .. }));
        }

        #[tokio::test]
        async fn test_wait_for_attached_missing() {
            let driver = MockDriver::new();
            let loc = Locator::label("Altitude (m)").with_timeout(Duration::from_millis(10));
            assert!(wait_for_attached(&driver, &loc).await.unwrap_err().is_timeout());
        }
    }
}
