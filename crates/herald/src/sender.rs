//! Sender identity.
//!
//! A [`Sender`] is a shared handle to whatever object emits a notification.
//! Observers can restrict themselves to a single sender; matching is by
//! allocation identity, never by value.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Shared handle to a notification sender.
///
/// Cloning the handle keeps the same identity.
#[derive(Clone)]
pub struct Sender {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Sender {
    /// Wrap `value` in a new sender with a fresh identity.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Use an existing shared object as a sender. Identity follows the `Arc`.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self { inner: value }
    }

    /// Borrow the underlying object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns `true` if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Sender) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sender").field(&self.addr()).finish()
    }
}

/// Non-owning sender reference stored on a subscription.
///
/// The filter does not keep the sender alive. Once the sender is dropped the
/// filter can never match again, and because the weak reference pins the
/// allocation, a new sender cannot reuse the address and match by accident.
#[derive(Clone)]
pub struct SenderFilter {
    target: Weak<dyn Any + Send + Sync>,
}

impl SenderFilter {
    /// Filter that matches only `sender`.
    pub fn new(sender: &Sender) -> Self {
        Self {
            target: Arc::downgrade(&sender.inner),
        }
    }

    /// Returns `true` if `sender` is the filtered object.
    ///
    /// A missing sender never matches.
    pub fn matches(&self, sender: Option<&Sender>) -> bool {
        match sender {
            Some(sender) => std::ptr::addr_eq(self.target.as_ptr(), sender.addr()),
            None => false,
        }
    }

    /// Returns `true` while the filtered sender is still alive.
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for SenderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderFilter")
            .field("target", &(self.target.as_ptr() as *const ()))
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Screen {
        title: &'static str,
    }

    #[test]
    fn test_clone_keeps_identity() {
        let a = Sender::new(Screen { title: "home" });
        let b = a.clone();

        assert!(a.ptr_eq(&b));
        assert_eq!(b.downcast_ref::<Screen>().map(|s| s.title), Some("home"));
    }

    #[test]
    fn test_equal_values_are_distinct_senders() {
        let a = Sender::new(1u32);
        let b = Sender::new(1u32);

        assert!(!a.ptr_eq(&b));
        let filter = SenderFilter::new(&a);
        assert!(filter.matches(Some(&a)));
        assert!(!filter.matches(Some(&b)));
    }

    #[test]
    fn test_filter_never_matches_missing_sender() {
        let a = Sender::new(());
        let filter = SenderFilter::new(&a);

        assert!(!filter.matches(None));
    }

    #[test]
    fn test_from_arc_shares_identity() {
        let screen = Arc::new(Screen { title: "settings" });
        let a = Sender::from_arc(screen.clone());
        let b = Sender::from_arc(screen);

        assert!(a.ptr_eq(&b));
        assert!(SenderFilter::new(&a).matches(Some(&b)));
    }

    #[test]
    fn test_filter_does_not_keep_sender_alive() {
        let a = Sender::new(Screen { title: "gone" });
        let filter = SenderFilter::new(&a);
        assert!(filter.is_live());

        drop(a);

        assert!(!filter.is_live());
        let fresh = Sender::new(Screen { title: "fresh" });
        assert!(!filter.matches(Some(&fresh)));
    }
}
