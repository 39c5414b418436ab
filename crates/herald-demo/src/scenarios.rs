//! Walkthrough scenarios, each on the shared demo registry.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use herald::{impl_payload, Registrar, Registry, Sender};

/// Base payload.
#[derive(Debug)]
pub struct Animal {
    pub name: String,
}

/// Payload subtype of [`Animal`].
#[derive(Debug)]
pub struct Cat {
    pub animal: Animal,
    pub indoor: bool,
}

impl_payload!(Animal);
impl_payload!(Cat => animal);

/// Typed observers only see payloads of their type.
pub fn payload_typing(registry: &Arc<Registry>) {
    let registrar = Registrar::with_registry(registry.clone());

    registrar
        .observe("settings.saved")
        .payload(|path: &String| tracing::info!(%path, "settings saved"));
    registrar
        .observe("settings.saved")
        .notification(|note| tracing::info!(name = note.name(), "saved notification seen"));

    let text = registry.post("settings.saved", None, Some(&String::from("/etc/app.toml")));
    let number = registry.post("settings.saved", None, Some(&42i32));

    tracing::info!(
        with_string = text.delivered(),
        with_number = number.delivered(),
        "payload typing"
    );
}

/// Observers of a base type also receive its subtypes.
pub fn subtype_covariance(registry: &Arc<Registry>) {
    let registrar = Registrar::with_registry(registry.clone());

    registrar
        .observe("zoo.arrival")
        .payload(|animal: &Animal| tracing::info!(name = %animal.name, "animal arrived"));
    registrar
        .observe("zoo.arrival")
        .payload(|cat: &Cat| tracing::info!(name = %cat.animal.name, indoor = cat.indoor, "cat arrived"));

    let dog = Animal {
        name: "rex".to_string(),
    };
    let cat = Cat {
        animal: Animal {
            name: "tom".to_string(),
        },
        indoor: true,
    };

    let for_dog = registry.post("zoo.arrival", None, Some(&dog));
    let for_cat = registry.post("zoo.arrival", None, Some(&cat));

    tracing::info!(
        animal_post = for_dog.delivered(),
        cat_post = for_cat.delivered(),
        "subtype covariance"
    );
}

/// Sender-filtered observers ignore other senders and anonymous posts.
pub fn sender_filtering(registry: &Arc<Registry>) {
    let registrar = Registrar::with_registry(registry.clone());
    let left = Sender::new("left-panel");
    let right = Sender::new("right-panel");

    registrar
        .observe("panel.closed")
        .from_sender(&left)
        .sender_payload(|sender, reason: &&'static str| {
            let panel = sender.and_then(|s| s.downcast_ref::<&str>()).copied();
            tracing::info!(?panel, reason = *reason, "left panel closed");
        });

    let from_left = registry.post("panel.closed", Some(&left), Some(&"user"));
    let from_right = registry.post("panel.closed", Some(&right), Some(&"user"));
    let anonymous = registry.post("panel.closed", None, Some(&"user"));

    tracing::info!(
        from_left = from_left.delivered(),
        from_right = from_right.delivered(),
        anonymous = anonymous.delivered(),
        "sender filtering"
    );
}

/// Disposing by name and dropping the registrar both stop delivery.
pub fn disposal(registry: &Arc<Registry>) {
    let hits = Arc::new(AtomicUsize::new(0));

    {
        let registrar = Registrar::with_registry(registry.clone());
        for name in ["session.opened", "session.closed"] {
            let hits = hits.clone();
            registrar.observe(name).notification(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        registry.post("session.opened", None, None);
        let removed = registrar.dispose("session.opened");
        registry.post("session.opened", None, None);
        tracing::info!(removed, remaining = ?registrar.observed_names(), "disposed by name");

        registry.post("session.closed", None, None);
    }

    registry.post("session.closed", None, None);
    tracing::info!(
        hits = hits.load(Ordering::SeqCst),
        live = registry.subscription_count(),
        "registrar dropped"
    );
}

/// A panicking observer between two healthy ones.
pub fn failing_observer(registry: &Arc<Registry>) {
    let registrar = Registrar::with_registry(registry.clone());

    registrar
        .observe("job.finished")
        .notification(|_| tracing::info!("first observer ran"));
    registrar
        .observe("job.finished")
        .notification(|_| panic!("observer failed"));
    registrar
        .observe("job.finished")
        .notification(|_| tracing::info!("third observer ran"));

    match panic::catch_unwind(AssertUnwindSafe(|| registry.post("job.finished", None, None))) {
        Ok(delivery) => match delivery.into_result() {
            Ok(delivered) => tracing::info!(delivered, "job observers finished"),
            Err(e) => tracing::warn!(error = %e, "job observers reported failures"),
        },
        Err(_) => tracing::warn!("observer panic propagated to the poster"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald::{FailurePolicy, RegistryConfig};

    #[test]
    fn test_walkthrough_counts() {
        let registry = Arc::new(Registry::new());

        payload_typing(&registry);
        subtype_covariance(&registry);
        sender_filtering(&registry);
        disposal(&registry);

        let stats = registry.metrics().snapshot();
        assert_eq!(stats.posts, 11);
        assert_eq!(stats.deliveries, 9);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.live_subscriptions(), 0);
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn test_failing_observer_isolated() {
        let registry = Arc::new(Registry::new());

        failing_observer(&registry);

        let stats = registry.metrics().snapshot();
        assert_eq!(stats.deliveries, 2);
        assert_eq!(stats.failures, 1);
    }

    #[test]
    fn test_failing_observer_propagated() {
        let registry = Arc::new(Registry::with_config(
            RegistryConfig::new().with_failure_policy(FailurePolicy::Propagate),
        ));

        failing_observer(&registry);

        assert_eq!(registry.metrics().failures(), 1);
        assert_eq!(registry.subscription_count(), 0);
    }
}
