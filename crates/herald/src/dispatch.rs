//! Synchronous, in-order dispatch of one notification.
//!
//! Dispatch walks a snapshot of the observer list taken when the post started.
//! Callbacks run on the posting thread with no registry lock held, so they
//! may observe, dispose or post again without corrupting the walk. A
//! subscription removed mid-dispatch is skipped for the rest of it.
//!
//! # Panic Safety
//!
//! Each callback runs under [`std::panic::catch_unwind`]. A panicking observer
//! never prevents later observers from running; what happens afterwards is
//! decided by the registry's [`FailurePolicy`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::FailurePolicy;
use crate::error::{CallbackFailure, Error, Result};
use crate::notification::Notification;
use crate::subscription::Subscription;

/// Outcome of one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    name: String,
    delivered: usize,
    filtered: usize,
    failures: Vec<CallbackFailure>,
}

impl Delivery {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Notification name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of callbacks that ran to completion.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Number of observers of the name that did not receive the notification.
    pub fn filtered(&self) -> usize {
        self.filtered
    }

    /// Observers that panicked, in dispatch order.
    pub fn failures(&self) -> &[CallbackFailure] {
        &self.failures
    }

    /// Returns `true` if no observer panicked.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a result, aggregating any observer panics into one error.
    pub fn into_result(self) -> Result<usize> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(Error::DispatchFailed {
                name: self.name,
                failures: self.failures,
            })
        }
    }
}

/// Result of walking a snapshot: the delivery report and, if any observer
/// panicked, the first panic payload.
pub(crate) struct Outcome {
    pub(crate) delivery: Delivery,
    pub(crate) panic: Option<Box<dyn Any + Send>>,
}

impl Outcome {
    /// Hand back the delivery, resuming the first panic under
    /// [`FailurePolicy::Propagate`].
    pub(crate) fn finish(self, policy: FailurePolicy) -> Delivery {
        match (policy, self.panic) {
            (FailurePolicy::Propagate, Some(panic)) => panic::resume_unwind(panic),
            _ => self.delivery,
        }
    }
}

/// Deliver `note` to every active, matching subscription in `snapshot`.
pub(crate) fn dispatch(snapshot: &[Arc<Subscription>], note: &Notification<'_>) -> Outcome {
    let mut delivery = Delivery::new(note.name());
    let mut first_panic = None;

    for subscription in snapshot {
        if !subscription.is_active() || !subscription.matches(note) {
            delivery.filtered += 1;
            continue;
        }

        tracing::trace!(
            name = note.name(),
            subscription_id = %subscription.id(),
            owner = %subscription.owner(),
            "delivering notification"
        );

        match panic::catch_unwind(AssertUnwindSafe(|| subscription.deliver(note))) {
            Ok(()) => delivery.delivered += 1,
            Err(panic) => {
                let failure =
                    CallbackFailure::new(subscription.id(), subscription.owner(), panic.as_ref());
                tracing::error!(
                    name = note.name(),
                    subscription_id = %failure.subscription,
                    owner = %failure.owner,
                    message = %failure.message,
                    "observer panicked during dispatch"
                );
                delivery.failures.push(failure);
                first_panic.get_or_insert(panic);
            }
        }
    }

    Outcome {
        delivery,
        panic: first_panic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::SenderFilter;
    use crate::subscription::{Callback, RegistrarId, SubscriptionId};
    use crate::Sender;

    use parking_lot::Mutex;

    fn sub(id: u64, callback: Callback) -> Arc<Subscription> {
        Arc::new(Subscription::new(
            SubscriptionId(id),
            RegistrarId(1),
            "Hoge",
            None,
            callback,
        ))
    }

    fn recorder(log: &Arc<Mutex<Vec<u64>>>, id: u64) -> Callback {
        let log = log.clone();
        Callback::notification(move |_| log.lock().push(id))
    }

    #[test]
    fn test_delivers_in_snapshot_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let snapshot = vec![sub(1, recorder(&log, 1)), sub(2, recorder(&log, 2)), sub(3, recorder(&log, 3))];

        let outcome = dispatch(&snapshot, &Notification::new("Hoge", None, None));

        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(outcome.delivery.delivered(), 3);
        assert_eq!(outcome.delivery.filtered(), 0);
        assert!(outcome.panic.is_none());
    }

    #[test]
    fn test_skips_inactive_and_unmatched() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let other = Sender::new(());
        let filtered = Arc::new(Subscription::new(
            SubscriptionId(2),
            RegistrarId(1),
            "Hoge",
            Some(SenderFilter::new(&other)),
            recorder(&log, 2),
        ));
        let removed = sub(3, recorder(&log, 3));
        removed.deactivate();
        let snapshot = vec![sub(1, recorder(&log, 1)), filtered, removed];

        let outcome = dispatch(&snapshot, &Notification::new("Hoge", None, None));

        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(outcome.delivery.delivered(), 1);
        assert_eq!(outcome.delivery.filtered(), 2);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let snapshot = vec![
            sub(1, recorder(&log, 1)),
            sub(2, Callback::notification(|_| panic!("observer 2 failed"))),
            sub(3, recorder(&log, 3)),
        ];

        let outcome = dispatch(&snapshot, &Notification::new("Hoge", None, None));

        assert_eq!(*log.lock(), vec![1, 3]);
        assert_eq!(outcome.delivery.delivered(), 2);
        assert_eq!(outcome.delivery.failures().len(), 1);
        assert_eq!(outcome.delivery.failures()[0].subscription, SubscriptionId(2));
        assert_eq!(outcome.delivery.failures()[0].message, "observer 2 failed");
        assert!(outcome.panic.is_some());
    }

    #[test]
    fn test_isolate_policy_returns_delivery() {
        let snapshot = vec![sub(1, Callback::notification(|_| panic!("boom")))];
        let outcome = dispatch(&snapshot, &Notification::new("Hoge", None, None));

        let delivery = outcome.finish(FailurePolicy::Isolate);

        assert!(!delivery.is_clean());
        let err = delivery.into_result().unwrap_err();
        assert!(matches!(err, Error::DispatchFailed { ref name, ref failures } if name == "Hoge" && failures.len() == 1));
    }

    #[test]
    fn test_propagate_policy_resumes_first_panic() {
        let snapshot = vec![
            sub(1, Callback::notification(|_| panic!("first"))),
            sub(2, Callback::notification(|_| panic!("second"))),
        ];
        let outcome = dispatch(&snapshot, &Notification::new("Hoge", None, None));
        assert_eq!(outcome.delivery.failures().len(), 2);

        let resumed = panic::catch_unwind(AssertUnwindSafe(|| {
            outcome.finish(FailurePolicy::Propagate);
        }))
        .unwrap_err();

        assert_eq!(resumed.downcast_ref::<&str>(), Some(&"first"));
    }

    #[test]
    fn test_clean_delivery_into_result() {
        let delivery = Delivery {
            name: "Hoge".to_string(),
            delivered: 4,
            filtered: 1,
            failures: Vec::new(),
        };

        assert!(delivery.is_clean());
        assert_eq!(delivery.into_result().unwrap(), 4);
    }
}
