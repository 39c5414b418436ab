//! Shared table of active subscriptions.
//!
//! A [`Registry`] maps each notification name to the ordered list of
//! subscriptions observing it. Registrars publish into it and posts are
//! matched against it. Most programs use the process-wide
//! [`Registry::global`]; tests and embedded components can create isolated
//! registries and hand them to [`Registrar::with_registry`](crate::Registrar::with_registry).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::config::RegistryConfig;
use crate::dispatch::{self, Delivery};
use crate::metrics::DispatchMetrics;
use crate::notification::Notification;
use crate::payload::Payload;
use crate::sender::Sender;
use crate::subscription::{RegistrarId, Subscription, SubscriptionId};

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Registry of observers keyed by notification name.
pub struct Registry {
    /// Observer lists in registration order. Empty lists are removed.
    table: DashMap<String, Vec<Arc<Subscription>>>,
    /// Next subscription ID.
    next_subscription_id: AtomicU64,
    /// Next registrar ID.
    next_registrar_id: AtomicU64,
    config: RegistryConfig,
    metrics: DispatchMetrics,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            table: DashMap::new(),
            next_subscription_id: AtomicU64::new(1),
            next_registrar_id: AtomicU64::new(1),
            config,
            metrics: DispatchMetrics::new(),
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Arc<Registry> {
        GLOBAL.get_or_init(|| {
            tracing::debug!("initializing global notification registry");
            Arc::new(Registry::new())
        })
    }

    pub(crate) fn next_registrar_id(&self) -> RegistrarId {
        RegistrarId(self.next_registrar_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn next_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Append a subscription to the list for its name.
    pub(crate) fn register(&self, subscription: Subscription) {
        tracing::debug!(
            subscription_id = %subscription.id(),
            owner = %subscription.owner(),
            name = subscription.name(),
            shape = ?subscription.shape(),
            payload_type = ?subscription.filter().payload_type,
            "subscription created"
        );

        self.table
            .entry(subscription.name().to_string())
            .or_default()
            .push(Arc::new(subscription));
        self.metrics.record_registered();
    }

    /// Remove every subscription `owner` holds under `name`.
    ///
    /// The remaining subscriptions keep their relative order. Returns the
    /// number removed.
    pub fn unregister(&self, owner: RegistrarId, name: &str) -> usize {
        let mut removed = Vec::new();
        if let Some(mut list) = self.table.get_mut(name) {
            take_owned(&mut list, owner, &mut removed);
        }
        self.table.remove_if(name, |_, list| list.is_empty());

        if !removed.is_empty() {
            tracing::debug!(owner = %owner, name, removed = removed.len(), "subscriptions removed");
        }
        self.release(removed)
    }

    /// Remove every subscription `owner` holds, under every name.
    ///
    /// Returns the number removed.
    pub fn unregister_all(&self, owner: RegistrarId) -> usize {
        let mut removed = Vec::new();
        self.table.retain(|_, list| {
            take_owned(list, owner, &mut removed);
            !list.is_empty()
        });

        if !removed.is_empty() {
            tracing::debug!(owner = %owner, removed = removed.len(), "all registrar subscriptions removed");
        }
        self.release(removed)
    }

    /// Remove every subscription from the registry.
    ///
    /// Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut removed = Vec::new();
        self.table.retain(|_, list| {
            removed.append(list);
            false
        });

        tracing::debug!(removed = removed.len(), "registry cleared");
        self.release(removed)
    }

    /// Deactivate and drop removed subscriptions. Must be called with no
    /// table lock held: dropping a callback may drop a registrar, which
    /// re-enters the table.
    fn release(&self, removed: Vec<Arc<Subscription>>) -> usize {
        for subscription in &removed {
            subscription.deactivate();
        }
        let count = removed.len();
        if count > 0 {
            self.metrics.record_removed(count as u64);
        }
        drop(removed);
        count
    }

    /// Post a notification to every matching observer, in registration order.
    ///
    /// Posting a name nobody observes is a no-op.
    pub fn post(
        &self,
        name: &str,
        sender: Option<&Sender>,
        payload: Option<&dyn Payload>,
    ) -> Delivery {
        // Copy the list and release the shard lock before any callback runs.
        let snapshot = self.table.get(name).map(|list| list.value().clone());
        self.metrics.record_post(snapshot.is_some());

        let Some(snapshot) = snapshot else {
            if self.config.log_unobserved {
                tracing::debug!(name, "notification has no observers");
            }
            return Delivery::new(name);
        };

        tracing::trace!(
            name,
            observers = snapshot.len(),
            has_sender = sender.is_some(),
            payload_type = payload.map(|p| p.type_name()),
            "posting notification"
        );

        let note = Notification::new(name, sender, payload);
        let outcome = dispatch::dispatch(&snapshot, &note);
        self.metrics.record_dispatch(
            outcome.delivery.delivered() as u64,
            outcome.delivery.filtered() as u64,
            outcome.delivery.failures().len() as u64,
        );

        outcome.finish(self.config.failure_policy)
    }

    /// Number of subscriptions observing `name`.
    pub fn observer_count(&self, name: &str) -> usize {
        self.table.get(name).map(|list| list.len()).unwrap_or(0)
    }

    /// Total number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.table.iter().map(|entry| entry.value().len()).sum()
    }

    /// Names with at least one observer, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Names under which `owner` holds at least one subscription, sorted.
    pub fn owned_names(&self, owner: RegistrarId) -> Vec<String> {
        let mut names: Vec<String> = self
            .table
            .iter()
            .filter(|entry| entry.value().iter().any(|s| s.owner() == owner))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of subscriptions held by `owner`.
    pub fn owned_count(&self, owner: RegistrarId) -> usize {
        self.table
            .iter()
            .map(|entry| entry.value().iter().filter(|s| s.owner() == owner).count())
            .sum()
    }

    /// Snapshot of the subscriptions observing `name`, in dispatch order.
    pub fn subscriptions(&self, name: &str) -> Vec<Arc<Subscription>> {
        self.table
            .get(name)
            .map(|list| list.value().clone())
            .unwrap_or_default()
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Dispatch metrics.
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `owner`'s subscriptions from `list` into `removed`, keeping the
/// order of both.
fn take_owned(
    list: &mut Vec<Arc<Subscription>>,
    owner: RegistrarId,
    removed: &mut Vec<Arc<Subscription>>,
) {
    if !list.iter().any(|subscription| subscription.owner() == owner) {
        return;
    }
    let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(list)
        .into_iter()
        .partition(|subscription| subscription.owner() == owner);
    *list = kept;
    removed.extend(gone);
}
