//! Dispatch metrics.
//!
//! Every [`Registry`](crate::Registry) keeps a set of relaxed atomic counters
//! describing its traffic. [`DispatchMetrics::snapshot`] copies them into a
//! serializable [`DispatchStats`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Counters for one registry.
pub struct DispatchMetrics {
    started_at: Instant,

    // Post metrics
    posts: AtomicU64,
    unobserved_posts: AtomicU64,
    deliveries: AtomicU64,
    filtered: AtomicU64,
    failures: AtomicU64,

    // Subscription metrics
    registered: AtomicU64,
    removed: AtomicU64,
}

impl DispatchMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            posts: AtomicU64::new(0),
            unobserved_posts: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            registered: AtomicU64::new(0),
            removed: AtomicU64::new(0),
        }
    }

    /// Record a post, and whether any observer list existed for its name.
    pub fn record_post(&self, observed: bool) {
        self.posts.fetch_add(1, Ordering::Relaxed);
        if !observed {
            self.unobserved_posts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of one dispatch.
    pub fn record_dispatch(&self, delivered: u64, filtered: u64, failed: u64) {
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.filtered.fetch_add(filtered, Ordering::Relaxed);
        self.failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a new subscription.
    pub fn record_registered(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record removed subscriptions.
    pub fn record_removed(&self, count: u64) {
        self.removed.fetch_add(count, Ordering::Relaxed);
    }

    /// Total posts.
    pub fn posts(&self) -> u64 {
        self.posts.load(Ordering::Relaxed)
    }

    /// Total callbacks invoked.
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    /// Total callback panics.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            uptime_secs: self.started_at.elapsed().as_secs(),
            posts: self.posts.load(Ordering::Relaxed),
            unobserved_posts: self.unobserved_posts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            subscriptions_registered: self.registered.load(Ordering::Relaxed),
            subscriptions_removed: self.removed.load(Ordering::Relaxed),
        }
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Seconds since the metrics were created.
    pub uptime_secs: u64,
    /// Posts, observed or not.
    pub posts: u64,
    /// Posts to a name with no observers.
    pub unobserved_posts: u64,
    /// Callbacks that ran to completion.
    pub deliveries: u64,
    /// Observers of a posted name that did not match.
    pub filtered: u64,
    /// Callbacks that panicked.
    pub failures: u64,
    /// Subscriptions ever registered.
    pub subscriptions_registered: u64,
    /// Subscriptions removed by dispose, drop or clear.
    pub subscriptions_removed: u64,
}

impl DispatchStats {
    /// Subscriptions registered and not yet removed.
    pub fn live_subscriptions(&self) -> u64 {
        self.subscriptions_registered
            .saturating_sub(self.subscriptions_removed)
    }
}
