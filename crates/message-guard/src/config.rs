//! Configuration for the safety gate.

use std::env;

/// Which instruction template the guard uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    /// Full screening for all three detection categories.
    Comprehensive,
    /// Prompt-injection screening only.
    PromptInjection,
    /// Malicious-intent screening only.
    MaliciousIntent,
    /// Condensed comprehensive template, the fallback for unrecognized values.
    Condensed,
}

impl CheckType {
    /// Parse a configured check type, falling back to the condensed template.
    pub fn from_str(value: &str) -> Self {
        match value {
            "comprehensive" => Self::Comprehensive,
            "prompt-injection" => Self::PromptInjection,
            "malicious-intent" => Self::MaliciousIntent,
            _ => Self::Condensed,
        }
    }

    /// The configuration string for this check type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::PromptInjection => "prompt-injection",
            Self::MaliciousIntent => "malicious-intent",
            Self::Condensed => "condensed",
        }
    }
}

/// Configuration for [`LlmGuard`](crate::LlmGuard).
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Which instruction template to use.
    pub check_type: CheckType,

    /// Whether transport/parse failures produce a safe result instead of an
    /// error. Fail-open is the deliberate default for this gate; flip to
    /// fail-closed where strictness matters more than availability.
    pub fail_open: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            check_type: CheckType::Comprehensive,
            fail_open: true,
        }
    }
}

impl GuardConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `GUARD_CHECK_TYPE` - Template selector (default: comprehensive;
    ///   unrecognized values select the condensed template)
    /// - `GUARD_FAIL_OPEN` - "true"/"1" to fail open (default: true)
    pub fn from_env() -> Self {
        let check_type = env::var("GUARD_CHECK_TYPE")
            .map(|v| CheckType::from_str(&v))
            .unwrap_or(CheckType::Comprehensive);

        let fail_open = env::var("GUARD_FAIL_OPEN")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Self {
            check_type,
            fail_open,
        }
    }

    /// Set the check type.
    pub fn with_check_type(mut self, check_type: CheckType) -> Self {
        self.check_type = check_type;
        self
    }

    /// Set the failure policy.
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }
}
