//! Scoped owner of subscriptions.
//!
//! A [`Registrar`] is created by whatever owns a set of observations (a
//! screen, a controller, a connection) and removes exactly the subscriptions
//! it created, either per name with [`Registrar::dispose`] or all at once
//! when it is dropped.
//!
//! # Lifecycle
//!
//! Dropping a registrar removes all of its subscriptions from the registry,
//! on every exit path including unwinding. Subsequent posts never reach its
//! callbacks.
//!
//! Callbacks are owned by the registry while subscribed. A callback that
//! captures an `Arc` of its own registrar keeps that registrar alive until
//! it is disposed explicitly.

use std::sync::Arc;

use crate::dispatch::Delivery;
use crate::notification::Notification;
use crate::payload::Payload;
use crate::registry::Registry;
use crate::sender::{Sender, SenderFilter};
use crate::subscription::{Callback, RegistrarId, Subscription};

/// Handle for creating and disposing subscriptions.
pub struct Registrar {
    id: RegistrarId,
    registry: Arc<Registry>,
}

impl Registrar {
    /// Create a registrar on the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(Registry::global().clone())
    }

    /// Create a registrar on `registry`.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        let id = registry.next_registrar_id();
        tracing::trace!(registrar = %id, "registrar created");

        Self { id, registry }
    }

    /// Post to the process-wide registry.
    ///
    /// Reaches every matching observer, whichever registrar created it.
    pub fn post(name: &str, sender: Option<&Sender>, payload: Option<&dyn Payload>) -> Delivery {
        Registry::global().post(name, sender, payload)
    }

    /// Start an observation of `name`.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use herald::{Registrar, Registry, Sender};
    ///
    /// let registry = Arc::new(Registry::new());
    /// let registrar = Registrar::with_registry(registry.clone());
    /// let screen = Sender::new("settings");
    ///
    /// registrar.observe("saved").payload(|path: &String| println!("saved {path}"));
    /// registrar
    ///     .observe("closed")
    ///     .from_sender(&screen)
    ///     .notification(|note| println!("{} closed", note.name()));
    ///
    /// registry.post("saved", None, Some(&String::from("/tmp/a")));
    /// ```
    pub fn observe(&self, name: impl Into<String>) -> Observe<'_> {
        Observe {
            registrar: self,
            name: name.into(),
            sender: None,
        }
    }

    /// Remove every subscription this registrar holds under `name`.
    ///
    /// Returns the number removed; zero is not an error.
    pub fn dispose(&self, name: &str) -> usize {
        self.registry.unregister(self.id, name)
    }

    /// Remove every subscription this registrar holds.
    pub fn dispose_all(&self) -> usize {
        self.registry.unregister_all(self.id)
    }

    /// Names this registrar currently observes, sorted.
    pub fn observed_names(&self) -> Vec<String> {
        self.registry.owned_names(self.id)
    }

    /// Number of subscriptions this registrar has created and not disposed.
    pub fn subscription_count(&self) -> usize {
        self.registry.owned_count(self.id)
    }

    /// Registrar ID.
    pub fn id(&self) -> RegistrarId {
        self.id
    }

    /// The registry this registrar publishes into.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn attach(&self, name: String, sender: Option<SenderFilter>, callback: Callback) {
        let id = self.registry.next_subscription_id();
        self.registry
            .register(Subscription::new(id, self.id, name, sender, callback));
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registrar {
    fn drop(&mut self) {
        let removed = self.registry.unregister_all(self.id);
        tracing::debug!(registrar = %self.id, removed, "registrar dropped");
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("id", &self.id)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// Pending observation created by [`Registrar::observe`].
///
/// Optionally narrowed to one sender, then completed by attaching a callback.
/// The callback's shape decides the payload filter.
#[must_use = "an observation does nothing until a callback is attached"]
pub struct Observe<'r> {
    registrar: &'r Registrar,
    name: String,
    sender: Option<SenderFilter>,
}

impl<'r> Observe<'r> {
    /// Only receive notifications posted by `sender`.
    pub fn from_sender(mut self, sender: &Sender) -> Self {
        self.sender = Some(SenderFilter::new(sender));
        self
    }

    /// Receive every matching notification, whatever its payload.
    pub fn notification<F>(self, f: F)
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        self.callback(Callback::notification(f));
    }

    /// Receive payloads of type `T` or any subtype of `T`.
    pub fn payload<T, F>(self, f: F)
    where
        T: Payload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.callback(Callback::payload(f));
    }

    /// Receive the sender together with payloads of type `T` or its subtypes.
    pub fn sender_payload<T, F>(self, f: F)
    where
        T: Payload,
        F: Fn(Option<&Sender>, &T) + Send + Sync + 'static,
    {
        self.callback(Callback::sender_payload(f));
    }

    /// Attach a prepared callback.
    pub fn callback(self, callback: Callback) {
        self.registrar.attach(self.name, self.sender, callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (hits.clone(), hits)
    }

    #[test]
    fn test_observe_registers_in_registry() {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());

        registrar.observe("Hoge").notification(|_| {});
        registrar.observe("Hoge").payload(|_: &String| {});
        registrar.observe("Fuga").notification(|_| {});

        assert_eq!(registry.observer_count("Hoge"), 2);
        assert_eq!(registrar.subscription_count(), 3);
        assert_eq!(registrar.observed_names(), vec!["Fuga".to_string(), "Hoge".to_string()]);
        assert!(registry.subscriptions("Hoge").iter().all(|s| s.owner() == registrar.id()));
    }

    #[test]
    fn test_dispose_leaves_other_registrars() {
        let registry = Arc::new(Registry::new());
        let mine = Registrar::with_registry(registry.clone());
        let theirs = Registrar::with_registry(registry.clone());
        let (hits, seen) = counter();

        mine.observe("Hoge").notification(|_| {});
        theirs
            .observe("Hoge")
            .notification(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(mine.dispose("Hoge"), 1);
        let delivery = registry.post("Hoge", None, None);

        assert_eq!(delivery.delivered(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(mine.subscription_count(), 0);
        assert_eq!(theirs.subscription_count(), 1);
    }

    #[test]
    fn test_dispose_unknown_name_is_noop() {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());

        assert_eq!(registrar.dispose("Nothing"), 0);
        assert_eq!(registry.metrics().snapshot().subscriptions_removed, 0);
    }

    #[test]
    fn test_drop_removes_everything() {
        let registry = Arc::new(Registry::new());
        {
            let registrar = Registrar::with_registry(registry.clone());
            registrar.observe("one").notification(|_| {});
            registrar.observe("two").payload(|_: &i32| {});
            registrar.observe("three").sender_payload(|_, _: &bool| {});
            assert_eq!(registry.subscription_count(), 3);
        }

        assert_eq!(registry.subscription_count(), 0);
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_drop_during_unwind_removes_subscriptions() {
        let registry = Arc::new(Registry::new());
        let handle = registry.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let registrar = Registrar::with_registry(handle);
            registrar.observe("Hoge").notification(|_| {});
            panic!("owner failed");
        }));

        assert!(result.is_err());
        assert_eq!(registry.observer_count("Hoge"), 0);
    }

    #[test]
    fn test_dispose_all_then_reuse() {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());
        registrar.observe("one").notification(|_| {});
        registrar.observe("two").notification(|_| {});

        assert_eq!(registrar.dispose_all(), 2);
        registrar.observe("one").notification(|_| {});

        assert_eq!(registry.subscription_count(), 1);
        assert_eq!(registrar.observed_names(), vec!["one".to_string()]);
    }

    #[test]
    fn test_registrar_ids_are_unique() {
        let registry = Arc::new(Registry::new());
        let a = Registrar::with_registry(registry.clone());
        let b = Registrar::with_registry(registry);

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_dispose_inside_callback_skips_later_observers() {
        let registry = Arc::new(Registry::new());
        let victim = Arc::new(Registrar::with_registry(registry.clone()));
        let killer = Registrar::with_registry(registry.clone());
        let (hits, seen) = counter();

        let target = victim.clone();
        killer.observe("Hoge").notification(move |_| {
            target.dispose("Hoge");
        });
        victim.observe("Hoge").notification(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        let delivery = registry.post("Hoge", None, None);

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(delivery.delivered(), 1);
        assert_eq!(delivery.filtered(), 1);
    }

    #[test]
    fn test_observe_inside_callback_waits_for_next_post() {
        let registry = Arc::new(Registry::new());
        let registrar = Arc::new(Registrar::with_registry(registry.clone()));
        let (hits, seen) = counter();

        let inner = registrar.clone();
        registrar.observe("Hoge").notification(move |_| {
            let hits = hits.clone();
            inner.observe("Hoge").notification(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(registry.post("Hoge", None, None).delivered(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        registry.post("Hoge", None, None);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        registrar.dispose_all();
    }

    #[test]
    fn test_introspection_follows_registry_clear() {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());
        registrar.observe("Hoge").notification(|_| {});
        registrar.observe("Fuga").payload(|_: &String| {});

        assert_eq!(registry.clear(), 2);

        assert_eq!(registrar.subscription_count(), 0);
        assert!(registrar.observed_names().is_empty());
        assert_eq!(registrar.dispose_all(), 0);
    }

    #[test]
    fn test_concurrent_observe_and_dispose_stay_consistent() {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());

        for _ in 0..20 {
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    for _ in 0..200 {
                        registrar.observe("x").notification(|_| {});
                    }
                });
                scope.spawn(|| {
                    for _ in 0..200 {
                        registrar.dispose("x");
                    }
                });
            });

            assert_eq!(registrar.subscription_count(), registry.observer_count("x"));
            assert_eq!(
                registrar.observed_names().is_empty(),
                registry.observer_count("x") == 0
            );
        }
    }
}
