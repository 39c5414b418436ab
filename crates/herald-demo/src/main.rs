//! Herald Demo - walkthrough of the notification broker.

mod config;
mod scenarios;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::Registry;

use crate::config::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=info,herald_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let with_failure = args.with_failure;
    let compact = args.compact;
    let config = args.into_config();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        failure_policy = %config.failure_policy,
        log_unobserved = config.log_unobserved,
        "starting herald demo"
    );

    let registry = Arc::new(Registry::with_config(config));

    scenarios::payload_typing(&registry);
    scenarios::subtype_covariance(&registry);
    scenarios::sender_filtering(&registry);
    scenarios::disposal(&registry);
    if with_failure {
        scenarios::failing_observer(&registry);
    }

    registry.post("nobody.listens", None, None);

    let stats = registry.metrics().snapshot();
    let json = if compact {
        serde_json::to_string(&stats)?
    } else {
        serde_json::to_string_pretty(&stats)?
    };
    println!("{json}");

    Ok(())
}
