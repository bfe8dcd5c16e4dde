//! Folds pod observations into the store
//!
//! One sequential consumer: every notification is evaluated and applied
//! before the next is looked at, so the store always reflects a single
//! consistent prefix of the event stream.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::debug;

use super::source::PodEvent;
use super::store::PodStore;
use super::strategy::ReadinessStrategy;

/// Seed the store from a full listing.
pub async fn seed_store(store: &mut PodStore, strategy: &dyn ReadinessStrategy, pods: Vec<Pod>) {
    for pod in pods {
        observe(store, strategy, &pod).await;
    }
}

/// Apply one lifecycle notification to the store.
pub async fn apply_event(store: &mut PodStore, strategy: &dyn ReadinessStrategy, event: PodEvent) {
    match event {
        PodEvent::Added(pod) | PodEvent::Modified(pod) => observe(store, strategy, &pod).await,
        PodEvent::Deleted(pod) => {
            let name = pod.name_any();
            store.remove(&name);
            debug!(pod = %name, ready = store.ready_count(), "Pod deleted");
        }
    }
}

async fn observe(store: &mut PodStore, strategy: &dyn ReadinessStrategy, pod: &Pod) {
    let name = pod.name_any();
    let ready = strategy.evaluate(pod).await;
    debug!(pod = %name, ready, "Observed pod");
    store.upsert(name, ready);
}
