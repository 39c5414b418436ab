//! Registry configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// What happens when an observer panics during dispatch.
///
/// Under either policy every other matching observer still runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the panic, record it in the [`Delivery`](crate::Delivery) and continue.
    #[default]
    Isolate,
    /// Finish the dispatch, then resume the first panic on the posting thread.
    Propagate,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "propagate" => Ok(FailurePolicy::Propagate),
            other => Err(Error::InvalidConfig(format!(
                "unknown failure policy `{other}` (expected `isolate` or `propagate`)"
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Isolate => f.write_str("isolate"),
            FailurePolicy::Propagate => f.write_str("propagate"),
        }
    }
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// How observer panics are handled.
    pub failure_policy: FailurePolicy,

    /// Emit a debug event for posts that reach no observer list.
    pub log_unobserved: bool,
}

impl RegistryConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable logging of unobserved posts.
    pub fn with_log_unobserved(mut self, enabled: bool) -> Self {
        self.log_unobserved = enabled;
        self
    }
}
