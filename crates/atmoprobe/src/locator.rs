//! Locator abstraction for element selection.
//!
//! A [`Selector`] says how to find elements; a [`Locator`] adds the waiting and
//! strictness rules used when acting on them. Selectors render to in-page
//! JavaScript expressions that evaluate to an array of matching elements, so
//! every driver operation is a single round trip.
//!
//! Text and label matching are case-insensitive substring matches over
//! whitespace-normalised text, the same rules a `text=` selector or a
//! get-by-label lookup applies.

use std::fmt;
use std::time::Duration;

use crate::result::{ProbeError, ProbeResult};

/// Default timeout for auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

const NORMALIZE_JS: &str = "const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase();";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "#altitude-desc")
    Css(String),
    /// Text content selector, resolves to the innermost elements containing the text
    Text(String),
    /// Accessible label selector (`<label>`, `aria-label`, `aria-labelledby`)
    Label(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a label selector
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Convert to a JavaScript expression yielding an array of elements
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(css) => format!("Array.from(document.querySelectorAll({}))", js_string(css)),
            Self::Text(text) => format!(
                "(() => {{ {NORMALIZE_JS} \
                 const needle = norm({needle}); \
                 const skip = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']); \
                 const rendered = (el) => {{ \
                   const walker = document.createTreeWalker(el, NodeFilter.SHOW_TEXT, {{ acceptNode: (node) => {{ \
                     for (let p = node.parentElement; p; p = p === el ? null : p.parentElement) {{ \
                       if (skip.has(p.tagName)) return NodeFilter.FILTER_REJECT; \
                     }} \
                     return NodeFilter.FILTER_ACCEPT; \
                   }} }}); \
                   let text = ''; \
                   while (walker.nextNode()) text += walker.currentNode.nodeValue; \
                   return text; \
                 }}; \
                 const root = document.body || document.documentElement; \
                 const hits = [root, ...root.querySelectorAll('*')] \
                   .filter(el => !skip.has(el.tagName) && norm(rendered(el)).includes(needle)); \
                 return hits.filter(el => !hits.some(other => other !== el && el.contains(other))); \
                 }})()",
                needle = js_string(text)
            ),
            Self::Label(label) => format!(
                "(() => {{ {NORMALIZE_JS} \
                 const needle = norm({needle}); \
                 const found = new Set(); \
                 for (const label of document.querySelectorAll('label')) {{ \
                   if (!norm(label.textContent).includes(needle)) continue; \
                   const control = label.control || (label.htmlFor ? document.getElementById(label.htmlFor) : null); \
                   if (control) found.add(control); \
                 }} \
                 for (const el of document.querySelectorAll('[aria-label]')) {{ \
                   if (norm(el.getAttribute('aria-label')).includes(needle)) found.add(el); \
                 }} \
                 for (const el of document.querySelectorAll('[aria-labelledby]')) {{ \
                   const text = el.getAttribute('aria-labelledby').split(/\\s+/) \
                     .map(id => {{ const ref = document.getElementById(id); return ref ? ref.textContent : ''; }}) \
                     .join(' '); \
                   if (norm(text).includes(needle)) found.add(el); \
                 }} \
                 return Array.from(found); \
                 }})()",
                needle = js_string(label)
            ),
            Self::TestId(id) => format!(
                "Array.from(document.querySelectorAll('[data-testid]')).filter(el => el.getAttribute('data-testid') === {})",
                js_string(id)
            ),
        }
    }

    /// Whether `candidate` satisfies a text or label selector's matching rule
    #[must_use]
    pub fn text_matches(needle: &str, candidate: &str) -> bool {
        normalize(candidate).contains(&normalize(needle))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css {css:?}"),
            Self::Text(text) => write!(f, "text {text:?}"),
            Self::Label(label) => write!(f, "label {label:?}"),
            Self::TestId(id) => write!(f, "test id {id:?}"),
        }
    }
}

/// Collapse whitespace runs and lowercase, as the in-page matcher does
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Render `value` as a JavaScript string literal
#[must_use]
pub fn js_string(value: &str) -> String {
    // A JSON string is a valid JS string literal.
    serde_json::Value::String(value.to_string()).to_string()
}

/// Locator options for customizing behavior
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

/// A locator for finding and interacting with elements
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// Locate by text anywhere in the page.
    ///
    /// Text locators are not strict: the same number may legitimately appear
    /// in several places.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text)).with_strict(false)
    }

    /// Locate a form control by its accessible label
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self::from_selector(Selector::label(label))
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the polling interval used while waiting
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Enable or disable strict mode
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Validate a match count against this locator's rules before acting on it
    pub fn check_count(&self, count: usize) -> ProbeResult<()> {
        match count {
            0 => Err(ProbeError::ElementNotFound {
                selector: self.selector.to_string(),
            }),
            1 => Ok(()),
            n if self.options.strict => Err(ProbeError::StrictModeViolation {
                selector: self.selector.to_string(),
                count: n,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.selector, f)
    }
}
