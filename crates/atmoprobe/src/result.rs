//! Result and error types for atmoprobe.

use thiserror::Error;

/// Result type for atmoprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can abort a probe run
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page error (script evaluation, closed page, ...)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// No element matched a locator
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// A strict locator matched more than one element
    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Selector description
        selector: String,
        /// Number of matches
        count: usize,
    },

    /// A bounded wait elapsed
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Altitude input could not be used
    #[error("Invalid altitude: {message}")]
    InvalidAltitude {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a screenshot error
    #[must_use]
    pub fn screenshot(message: impl Into<String>) -> Self {
        Self::Screenshot {
            message: message.into(),
        }
    }

    /// Whether this error came from a bounded wait running out
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = ProbeError::Timeout {
            what: "text \"255.65\"".to_string(),
            ms: 5000,
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timed out after 5000ms waiting for text \"255.65\""
        );
    }

    #[test]
    fn test_strict_mode_message() {
        let err = ProbeError::StrictModeViolation {
            selector: "label \"Altitude (m)\"".to_string(),
            count: 2,
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("2 elements"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ProbeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }

    #[test]
    fn test_helpers() {
        assert!(ProbeError::page("closed").to_string().contains("closed"));
        assert!(ProbeError::screenshot("empty")
            .to_string()
            .starts_with("Screenshot failed"));
    }
}
