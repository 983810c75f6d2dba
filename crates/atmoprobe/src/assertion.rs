//! Check outcomes.
//!
//! Soft checks are reported and the run continues; hard checks abort the run
//! when they fail.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// How a failed check affects the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Report and continue
    Soft,
    /// Abort the run
    Hard,
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Short name of what was checked
    pub name: String,
    /// Soft or hard
    pub severity: Severity,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl Check {
    /// Create a passing check
    #[must_use]
    pub fn pass(name: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            passed: true,
            message: message.into(),
        }
    }

    /// Create a failing check
    #[must_use]
    pub fn fail(name: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            passed: false,
            message: message.into(),
        }
    }

    /// Check that an observed value equals the expected one
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(
        name: impl Into<String>,
        severity: Severity,
        expected: &T,
        actual: &T,
    ) -> Self {
        if expected == actual {
            Self::pass(name, severity, format!("got {actual:?}"))
        } else {
            Self::fail(
                name,
                severity,
                format!("expected {expected:?}, got {actual:?}"),
            )
        }
    }

    /// Check that a condition holds
    #[must_use]
    pub fn is_true(
        name: impl Into<String>,
        severity: Severity,
        condition: bool,
        on_pass: &str,
        on_fail: &str,
    ) -> Self {
        if condition {
            Self::pass(name, severity, on_pass)
        } else {
            Self::fail(name, severity, on_fail)
        }
    }

    /// Whether this is a failed soft check
    #[must_use]
    pub fn is_soft_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Soft
    }

    /// Whether this is a failed hard check
    #[must_use]
    pub fn is_hard_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Hard
    }
}
