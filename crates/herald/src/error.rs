//! Herald error types.

use std::fmt;

use thiserror::Error;

use crate::subscription::{RegistrarId, SubscriptionId};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Herald errors.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more observers panicked while a notification was dispatched.
    ///
    /// Every other matching observer still ran.
    #[error("{} observer(s) for `{name}` failed during dispatch", failures.len())]
    DispatchFailed {
        /// Notification name.
        name: String,
        /// The failed deliveries, in dispatch order.
        failures: Vec<CallbackFailure>,
    },

    /// Configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A single observer that panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFailure {
    /// Subscription whose callback panicked.
    pub subscription: SubscriptionId,
    /// Registrar that created the subscription.
    pub owner: RegistrarId,
    /// Panic message, if it carried one.
    pub message: String,
}

impl CallbackFailure {
    pub(crate) fn new(
        subscription: SubscriptionId,
        owner: RegistrarId,
        panic: &(dyn std::any::Any + Send),
    ) -> Self {
        let message = if let Some(s) = panic.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "callback panicked".to_string()
        };

        Self {
            subscription,
            owner,
            message,
        }
    }
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subscription {} (registrar {}): {}",
            self.subscription, self.owner, self.message
        )
    }
}
