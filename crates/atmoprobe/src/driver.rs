//! PageDriver - the browser seam the scenario runs against.
//!
//! The scenario only needs a handful of page operations, so the trait stays
//! small: navigate, count/inspect located elements, type, click, capture and
//! close. [`ChromiumDriver`](crate::ChromiumDriver) implements it over CDP;
//! [`MockDriver`] implements it over an in-memory element list so the
//! procedure can be exercised without a browser.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

use crate::locator::{Locator, Selector};
use crate::result::{ProbeError, ProbeResult};

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Screenshot {
    /// Wrap PNG bytes, reading the dimensions from the image header
    pub fn from_png(data: Vec<u8>) -> ProbeResult<Self> {
        let (width, height) = {
            let decoder = png::Decoder::new(std::io::Cursor::new(data.as_slice()));
            let reader = decoder
                .read_info()
                .map_err(|e| ProbeError::screenshot(format!("not a PNG image: {e}")))?;
            (reader.info().width, reader.info().height)
        };
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Write the image to `path`, creating parent directories as needed
    pub async fn save(&self, path: &Path) -> ProbeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }
}

/// Abstract page driver for browser automation
///
/// Element operations take a [`Locator`] and apply its strictness rules:
/// acting on zero matches is [`ProbeError::ElementNotFound`], acting on
/// several matches through a strict locator is
/// [`ProbeError::StrictModeViolation`]. `is_visible` never fails on zero
/// matches, it reports `false`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Count elements matching a selector
    async fn count(&self, selector: &Selector) -> ProbeResult<usize>;

    /// Whether the located element (any match, for non-strict locators) is visible
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Read an attribute of the located element
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Replace the value of the located input and notify the page
    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Click the located element
    async fn click(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Take a PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// Close the page and the browser behind it
    async fn close(&mut self) -> ProbeResult<()>;
}

/// An element in the mock page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Tag name, lowercase
    pub tag: String,
    /// `id` attribute
    pub id: Option<String>,
    /// Accessible label (from a `<label>` or `aria-label`)
    pub label: Option<String>,
    /// Text content
    pub text: String,
    /// Other attributes
    pub attributes: BTreeMap<String, String>,
    /// Current value for form controls
    pub value: String,
    /// Whether the element is rendered with a non-empty box
    pub visible: bool,
}

impl MockElement {
    /// Create a visible element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            ..Self::default()
        }
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the accessible label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            // The mock understands `#id` and bare tag names only.
            Selector::Css(css) => css
                .strip_prefix('#')
                .map_or(self.tag == *css, |id| self.id.as_deref() == Some(id)),
            Selector::Text(text) => Selector::text_matches(text, &self.text),
            Selector::Label(label) => self
                .label
                .iter()
                .chain(self.attributes.get("aria-label"))
                .any(|candidate| Selector::text_matches(label, candidate)),
            Selector::TestId(id) => self.attributes.get("data-testid") == Some(id),
        }
    }
}

type Reaction = Box<dyn Fn(&str, &mut Vec<MockElement>) + Send + Sync>;

/// Mock driver for unit testing
///
/// Page reactivity is modelled with rules: [`MockDriver::on_fill`] runs after
/// an input is filled and [`MockDriver::on_click`] after an element is
/// clicked. Fill rules receive the typed value, click rules the clicked
/// element's accessible name; both get the element list to mutate.
#[derive(Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Elements of the loaded page
    pub elements: Vec<MockElement>,
    /// Call history for verification
    pub call_history: Vec<String>,
    /// Navigation fails with this message when set
    pub navigation_error: Option<String>,
    /// Screenshots fail when set
    pub fail_screenshots: bool,
    fill_rules: Vec<Reaction>,
    click_rules: Vec<Reaction>,
    closed: bool,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("current_url", &self.current_url)
            .field("elements", &self.elements)
            .field("call_history", &self.call_history)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock element
    pub fn add_element(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// React to an input being filled
    pub fn on_fill<F>(&mut self, rule: F)
    where
        F: Fn(&str, &mut Vec<MockElement>) + Send + Sync + 'static,
    {
        self.fill_rules.push(Box::new(rule));
    }

    /// React to an element being clicked
    pub fn on_click<F>(&mut self, rule: F)
    where
        F: Fn(&str, &mut Vec<MockElement>) + Send + Sync + 'static,
    {
        self.click_rules.push(Box::new(rule));
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Whether `close` has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn resolve(&self, locator: &Locator) -> ProbeResult<usize> {
        let matches: Vec<usize> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.matches(locator.selector()))
            .map(|(idx, _)| idx)
            .collect();
        locator.check_count(matches.len())?;
        Ok(matches[0])
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            return Err(ProbeError::page("page has been closed"));
        }
        Ok(())
    }
}

/// A 1x1 PNG standing in for a capture
fn blank_png() -> ProbeResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, 1, 1);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ProbeError::screenshot(e.to_string()))?;
        writer
            .write_image_data(&[255, 255, 255, 255])
            .map_err(|e| ProbeError::screenshot(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| ProbeError::screenshot(e.to_string()))?;
    }
    Ok(buf)
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.ensure_open()?;
        self.call_history.push(format!("navigate:{url}"));
        if let Some(message) = &self.navigation_error {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            });
        }
        self.current_url = url.to_string();
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
        self.ensure_open()?;
        Ok(self.elements.iter().filter(|el| el.matches(selector)).count())
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.ensure_open()?;
        let matches: Vec<&MockElement> = self
            .elements
            .iter()
            .filter(|el| el.matches(locator.selector()))
            .collect();
        if matches.is_empty() {
            return Ok(false);
        }
        locator.check_count(matches.len())?;
        Ok(matches.iter().any(|el| el.visible))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        self.ensure_open()?;
        let idx = self.resolve(locator)?;
        let el = &self.elements[idx];
        Ok(match name {
            "id" => el.id.clone(),
            "value" => Some(el.value.clone()),
            _ => el.attributes.get(name).cloned(),
        })
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
        self.ensure_open()?;
        let idx = self.resolve(locator)?;
        if !matches!(self.elements[idx].tag.as_str(), "input" | "textarea") {
            return Err(ProbeError::page(format!("{locator} is not a text input")));
        }
        self.elements[idx].value = value.to_string();
        self.call_history.push(format!("fill:{value}"));
        for rule in &self.fill_rules {
            rule(value, &mut self.elements);
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.ensure_open()?;
        let idx = self.resolve(locator)?;
        let el = &self.elements[idx];
        let label = el
            .label
            .clone()
            .or_else(|| el.attributes.get("aria-label").cloned())
            .unwrap_or_else(|| el.text.clone());
        self.call_history.push(format!("click:{label}"));
        for rule in &self.click_rules {
            rule(&label, &mut self.elements);
        }
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        self.ensure_open()?;
        if self.fail_screenshots {
            return Err(ProbeError::screenshot("mock screenshot failure"));
        }
        Screenshot::from_png(blank_png()?)
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.call_history.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}
