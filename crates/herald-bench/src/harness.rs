//! Benchmark harness helpers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use herald::{Registrar, Registry, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fixtures::{Animal, Cat, Scale};

/// Notification name used by the populated contexts.
pub const NAME: &str = "bench.notification";

/// Isolated registry with a registrar and a delivery counter.
pub struct TestContext {
    pub registry: Arc<Registry>,
    pub registrar: Registrar,
    pub senders: Vec<Sender>,
    pub hits: Arc<AtomicU64>,
}

impl TestContext {
    /// Create an empty context.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());
        let registrar = Registrar::with_registry(registry.clone());
        let senders = (0..4).map(Sender::new).collect();

        Self {
            registry,
            registrar,
            senders,
            hits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Observers with no filters.
    pub fn with_unfiltered(scale: Scale) -> Self {
        let ctx = Self::new();
        for _ in 0..scale.observers() {
            let hits = ctx.hits.clone();
            ctx.registrar.observe(NAME).notification(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
        ctx
    }

    /// A seeded mix of unfiltered, sender-filtered, `Animal`-typed and
    /// `Cat`-typed observers.
    pub fn with_mixed(scale: Scale) -> Self {
        let ctx = Self::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..scale.observers() {
            let hits = ctx.hits.clone();
            match rng.gen_range(0..4) {
                0 => ctx.registrar.observe(NAME).notification(move |_| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
                1 => {
                    let sender = &ctx.senders[rng.gen_range(0..ctx.senders.len())];
                    ctx.registrar
                        .observe(NAME)
                        .from_sender(sender)
                        .notification(move |_| {
                            hits.fetch_add(1, Ordering::Relaxed);
                        })
                }
                2 => ctx.registrar.observe(NAME).payload(move |_: &Animal| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
                _ => ctx
                    .registrar
                    .observe(NAME)
                    .sender_payload(move |_, cat: &Cat| {
                        hits.fetch_add(u64::from(cat.lives), Ordering::Relaxed);
                    }),
            }
        }
        ctx
    }

    /// Number of callbacks run so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
