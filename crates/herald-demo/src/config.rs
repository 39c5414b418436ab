//! Demo configuration.

use clap::Parser;
use herald::{FailurePolicy, RegistryConfig};

/// Command-line arguments for the demo.
#[derive(Parser, Debug)]
#[command(name = "herald-demo")]
#[command(version, about = "Herald notification broker walkthrough", long_about = None)]
pub struct Args {
    /// What happens when an observer panics: `isolate` or `propagate`.
    #[arg(long, default_value = "isolate")]
    pub failure_policy: FailurePolicy,

    /// Log posts that reach no observers.
    #[arg(long)]
    pub log_unobserved: bool,

    /// Include the scenario with a panicking observer.
    #[arg(long)]
    pub with_failure: bool,

    /// Print dispatch statistics as compact JSON.
    #[arg(long)]
    pub compact: bool,
}

impl Args {
    /// Convert command-line arguments to registry configuration.
    pub fn into_config(self) -> RegistryConfig {
        RegistryConfig::new()
            .with_failure_policy(self.failure_policy)
            .with_log_unobserved(self.log_unobserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["herald-demo"]);
        assert!(!args.with_failure);
        assert!(!args.compact);

        let config = args.into_config();
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert!(!config.log_unobserved);
    }

    #[test]
    fn test_policy_flag() {
        let args = Args::parse_from([
            "herald-demo",
            "--failure-policy",
            "Propagate",
            "--log-unobserved",
        ]);
        let config = args.into_config();

        assert_eq!(config.failure_policy, FailurePolicy::Propagate);
        assert!(config.log_unobserved);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = Args::try_parse_from(["herald-demo", "--failure-policy", "ignore"]);

        assert!(result.is_err());
    }
}
