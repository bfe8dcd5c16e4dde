//! Strategy pattern for per-pod readiness determination
//!
//! Two interchangeable strategies decide whether a single pod counts
//! toward the quorum: an HTTP reachability probe against the pod's
//! discovery port, and an inspection of the pod's init container state.
//! Adding a strategy means implementing the trait and extending
//! [`select_strategy`].

pub mod http_probe;
pub mod init_state;

pub use http_probe::HttpProbeStrategy;
pub use init_state::InitStateStrategy;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

use crate::config::{Config, StrategyKind};

/// Decides whether one pod is ready, from its last observed state.
///
/// Implementations must degrade every failure (unreachable pod, absent
/// status block) to `false`: a bad probe marks one pod unready, it never
/// aborts the wait.
#[async_trait]
pub trait ReadinessStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Evaluate a single pod observation
    async fn evaluate(&self, pod: &Pod) -> bool;
}

/// Select the readiness strategy based on configuration
pub fn select_strategy(config: &Config) -> Box<dyn ReadinessStrategy> {
    match config.strategy {
        StrategyKind::Http => Box::new(HttpProbeStrategy::new(config.port, config.probe_timeout)),
        StrategyKind::Init => Box::new(InitStateStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_select_strategy_defaults_to_http_probe() {
        let config = Config::try_parse_from(["portti"]).expect("default args parse");

        let strategy = select_strategy(&config);

        assert_eq!(strategy.name(), "http-probe");
    }

    #[test]
    fn test_select_strategy_http() {
        let config =
            Config::try_parse_from(["portti", "--strategy", "http"]).expect("args parse");

        let strategy = select_strategy(&config);

        assert_eq!(strategy.name(), "http-probe");
    }

    #[test]
    fn test_select_strategy_init() {
        let config =
            Config::try_parse_from(["portti", "--strategy", "init"]).expect("args parse");

        let strategy = select_strategy(&config);

        assert_eq!(strategy.name(), "init-state");
    }
}
