//! Browser control for headless testing.
//!
//! Real browser control via the Chrome `DevTools` Protocol. With the `browser`
//! feature enabled, [`ChromiumDriver`] launches Chromium through chromiumoxide
//! and implements [`PageDriver`](crate::PageDriver) by evaluating locator
//! queries inside the page.

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{PageDriver, Screenshot};
    use crate::locator::{js_string, Locator, Selector};
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use tokio::sync::Mutex;

    const VISIBLE_JS: &str = "const isVisible = (el) => { \
        const rect = el.getBoundingClientRect(); \
        const style = window.getComputedStyle(el); \
        return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden'; \
    };";

    /// What a locator script reports back: the match count plus the
    /// operation's value on the first (or, for visibility, any) match.
    #[derive(Debug, Deserialize)]
    struct Probe<T> {
        count: usize,
        value: Option<T>,
    }

    /// Browser instance with a single page, driven over CDP
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
        closed: bool,
    }

    impl ChromiumDriver {
        /// Launch a new browser instance and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunch { message })?;

            let (mut browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            // Spawn handler task
            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "CDP handler stopped");
                        break;
                    }
                }
            });

            let page = match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    let _ = browser.close().await;
                    handle.abort();
                    return Err(ProbeError::BrowserLaunch {
                        message: format!("could not open a page: {e}"),
                    });
                }
            };

            tracing::debug!(headless = config.headless, "browser launched");

            Ok(Self {
                browser: Mutex::new(browser),
                page,
                handle,
                closed: false,
            })
        }

        async fn evaluate<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            let params = EvaluateParams::builder()
                .expression(script)
                .return_by_value(true)
                .build()
                .map_err(ProbeError::page)?;
            let result = self
                .page
                .evaluate_expression(params)
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
            result
                .into_value()
                .map_err(|e| ProbeError::page(e.to_string()))
        }

        /// Run `action` (a JS expression over `el`) against the first match
        async fn on_first<T: DeserializeOwned>(
            &self,
            locator: &Locator,
            action: &str,
        ) -> ProbeResult<Option<T>> {
            let script = format!(
                "(() => {{ const matches = {query}; \
                 if (matches.length === 0) return {{ count: 0, value: null }}; \
                 const el = matches[0]; \
                 return {{ count: matches.length, value: {action} }}; }})()",
                query = locator.selector().to_query(),
            );
            let probe: Probe<T> = self.evaluate(script).await?;
            locator.check_count(probe.count)?;
            Ok(probe.value)
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
            self.evaluate(format!("({}).length", selector.to_query()))
                .await
        }

        async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
            let script = format!(
                "(() => {{ {VISIBLE_JS} const matches = {query}; \
                 return {{ count: matches.length, value: matches.some(isVisible) }}; }})()",
                query = locator.selector().to_query(),
            );
            let probe: Probe<bool> = self.evaluate(script).await?;
            if probe.count == 0 {
                return Ok(false);
            }
            locator.check_count(probe.count)?;
            Ok(probe.value.unwrap_or(false))
        }

        async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
            self.on_first(locator, &format!("el.getAttribute({})", js_string(name)))
                .await
        }

        async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
            // The native setter bypasses framework value tracking so the
            // dispatched input event is seen as a real change.
            let action = format!(
                "(() => {{ \
                 const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype \
                   : el instanceof HTMLInputElement ? HTMLInputElement.prototype : null; \
                 if (!proto) return false; \
                 el.focus(); \
                 Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {value}); \
                 el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return true; }})()",
                value = js_string(value),
            );
            let filled: Option<bool> = self.on_first(locator, &action).await?;
            if filled == Some(true) {
                Ok(())
            } else {
                Err(ProbeError::page(format!("{locator} is not a text input")))
            }
        }

        async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
            let _: Option<bool> = self
                .on_first(locator, "(el.click(), true)")
                .await?;
            Ok(())
        }

        async fn screenshot(&self) -> ProbeResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot = self
                .page
                .execute(params)
                .await
                .map_err(|e| ProbeError::screenshot(e.to_string()))?;

            let data = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::screenshot(e.to_string()))?;
            Screenshot::from_png(data)
        }

        async fn close(&mut self) -> ProbeResult<()> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            let browser = self.browser.get_mut();
            let result = browser.close().await;
            if let Err(e) = browser.wait().await {
                tracing::debug!(error = %e, "browser process did not exit cleanly");
            }
            self.handle.abort();
            result.map(|_| ()).map_err(|e| ProbeError::page(e.to_string()))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;
