//! Herald - typed in-process notification broker.
//!
//! Observers register for a named notification through a [`Registrar`],
//! optionally restricted to one [`Sender`] and typed to a [`Payload`] type.
//! A post broadcasts a name with an optional sender and payload; every
//! observer whose name, sender filter and payload type all match is invoked
//! synchronously, in registration order.
//!
//! Dropping a registrar removes every subscription it created, so no
//! callback outlives its owner.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use herald::{Registrar, Registry};
//!
//! let registry = Arc::new(Registry::new());
//! let total = Arc::new(AtomicUsize::new(0));
//!
//! {
//!     let registrar = Registrar::with_registry(registry.clone());
//!     let sum = total.clone();
//!     registrar.observe("count").payload(move |n: &usize| {
//!         sum.fetch_add(*n, Ordering::SeqCst);
//!     });
//!
//!     registry.post("count", None, Some(&2usize));
//!     registry.post("count", None, Some(&"ignored"));
//! }
//!
//! // The registrar is gone, so is its observer.
//! registry.post("count", None, Some(&40usize));
//! assert_eq!(total.load(Ordering::SeqCst), 2);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod payload;
pub mod registrar;
pub mod registry;
pub mod sender;
pub mod subscription;

pub use config::{FailurePolicy, RegistryConfig};
pub use dispatch::Delivery;
pub use error::{CallbackFailure, Error, Result};
pub use metrics::{DispatchMetrics, DispatchStats};
pub use notification::Notification;
pub use payload::{Lineage, Payload, PayloadType};
pub use registrar::{Observe, Registrar};
pub use registry::Registry;
pub use sender::{Sender, SenderFilter};
pub use subscription::{
    Callback, CallbackShape, RegistrarId, Subscription, SubscriptionFilter, SubscriptionId,
};

/// Post a notification to the process-wide registry.
///
/// Equivalent to [`Registrar::post`].
pub fn post(name: &str, sender: Option<&Sender>, payload: Option<&dyn Payload>) -> Delivery {
    Registry::global().post(name, sender, payload)
}
