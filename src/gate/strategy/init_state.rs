//! Init container state strategy
//!
//! A pod counts as ready once any of its init containers reports a
//! running state. Useful when the workload gates on a sidecar-style
//! init phase instead of exposing an HTTP port; reads the observation
//! as delivered, no network involved.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

use super::ReadinessStrategy;

pub struct InitStateStrategy;

#[async_trait]
impl ReadinessStrategy for InitStateStrategy {
    fn name(&self) -> &'static str {
        "init-state"
    }

    async fn evaluate(&self, pod: &Pod) -> bool {
        pod.status
            .as_ref()
            .and_then(|status| status.init_container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .any(|cs| cs.state.as_ref().map(|state| state.running.is_some()).unwrap_or(false))
            })
            .unwrap_or(false)
    }
}
