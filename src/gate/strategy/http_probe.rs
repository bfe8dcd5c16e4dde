//! HTTP reachability strategy
//!
//! A pod counts as ready when its discovery port answers an HTTP GET
//! with a success status. Every sibling runs the same gate binary, so
//! the address probed here is the sibling's own discovery server.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::time::Duration;
use tracing::debug;

use super::ReadinessStrategy;

pub struct HttpProbeStrategy {
    port: u16,
    probe_timeout: Duration,
    client: reqwest::Client,
}

impl HttpProbeStrategy {
    pub fn new(port: u16, probe_timeout: Duration) -> Self {
        Self {
            port,
            probe_timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReadinessStrategy for HttpProbeStrategy {
    fn name(&self) -> &'static str {
        "http-probe"
    }

    async fn evaluate(&self, pod: &Pod) -> bool {
        // A pod without an address has not been scheduled onto the
        // network yet: unready, not an error
        let Some(ip) = pod
            .status
            .as_ref()
            .and_then(|status| status.pod_ip.as_deref())
            .filter(|ip| !ip.is_empty())
        else {
            debug!(pod = %pod.name_any(), "Pod has no address yet");
            return false;
        };

        let url = format!("http://{}:{}/", ip, self.port);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(pod = %pod.name_any(), status = %response.status(), "Probe answered with non-success status");
                false
            }
            Err(e) => {
                debug!(pod = %pod.name_any(), error = %e, "Probe failed");
                false
            }
        }
    }
}
