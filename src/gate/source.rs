//! Pod source collaborator
//!
//! Abstracts how pod state is acquired so the gate controller can be
//! driven by a scripted fake in tests. The production source is the
//! Kubernetes API: a one-shot listing, plus a watch resumed from the
//! listing's resourceVersion so no event between the two is missed.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, WatchEvent, WatchParams};
use tracing::debug;

use super::GateError;

/// One pod lifecycle notification.
#[derive(Debug)]
pub enum PodEvent {
    Added(Pod),
    Modified(Pod),
    Deleted(Pod),
}

/// Result of the initial listing: the pods in scope plus the resumption
/// token a subsequent watch must start from.
pub struct PodSnapshot {
    pub pods: Vec<Pod>,
    pub resource_version: String,
}

pub type PodEventStream = BoxStream<'static, Result<PodEvent, GateError>>;

/// Where pod state comes from.
///
/// Production code uses [`KubePodSource`]; controller tests inject a
/// scripted fake instead of a live cluster.
#[async_trait]
pub trait PodSource: Send + Sync {
    /// One-shot listing of every pod in scope
    async fn list(&self) -> Result<PodSnapshot, GateError>;

    /// Subscribe to lifecycle notifications from the given resumption token
    async fn subscribe(&self, resource_version: &str) -> Result<PodEventStream, GateError>;
}

/// Pod source backed by the Kubernetes API
pub struct KubePodSource {
    api: Api<Pod>,
    selector: Option<String>,
}

impl KubePodSource {
    pub fn new(api: Api<Pod>, selector: Option<String>) -> Self {
        Self { api, selector }
    }
}

#[async_trait]
impl PodSource for KubePodSource {
    async fn list(&self) -> Result<PodSnapshot, GateError> {
        let mut params = ListParams::default();
        if let Some(selector) = &self.selector {
            params = params.labels(selector);
        }

        let list = self.api.list(&params).await.map_err(GateError::List)?;
        Ok(PodSnapshot {
            resource_version: list.metadata.resource_version.unwrap_or_default(),
            pods: list.items,
        })
    }

    async fn subscribe(&self, resource_version: &str) -> Result<PodEventStream, GateError> {
        let mut params = WatchParams::default().disable_bookmarks();
        if let Some(selector) = &self.selector {
            params = params.labels(selector);
        }

        let stream = self
            .api
            .watch(&params, resource_version)
            .await
            .map_err(GateError::WatchInit)?;

        Ok(stream
            .filter_map(|event| async move { map_watch_event(event) })
            .boxed())
    }
}

/// Translate one raw watch item into a gate-level event.
///
/// Bookmarks carry no pod observation and are dropped; the apiserver's
/// in-band ERROR and any transport failure are fatal, per the gate's
/// error contract.
fn map_watch_event(
    event: Result<WatchEvent<Pod>, kube::Error>,
) -> Option<Result<PodEvent, GateError>> {
    match event {
        Ok(WatchEvent::Added(pod)) => Some(Ok(PodEvent::Added(pod))),
        Ok(WatchEvent::Modified(pod)) => Some(Ok(PodEvent::Modified(pod))),
        Ok(WatchEvent::Deleted(pod)) => Some(Ok(PodEvent::Deleted(pod))),
        Ok(WatchEvent::Bookmark(_)) => {
            debug!("Skipping watch bookmark");
            None
        }
        Ok(WatchEvent::Error(e)) => Some(Err(GateError::WatchStream(e))),
        Err(e) => Some(Err(GateError::Watch(e))),
    }
}

/// Scripted pod source for controller tests.
///
/// Serves queued listings in order (the last one repeats once the queue
/// runs dry) and a fixed event script; can be told to hang after the
/// script or to reject subscription outright.
#[cfg(test)]
pub struct FakePodSource {
    listings: std::sync::Mutex<std::collections::VecDeque<Vec<Pod>>>,
    list_calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    events: std::sync::Mutex<Option<Vec<Result<PodEvent, GateError>>>>,
    hang_after_events: bool,
    hang_listing: bool,
    subscribe_allowed: bool,
}

#[cfg(test)]
impl FakePodSource {
    pub fn new(initial: Vec<Pod>) -> Self {
        Self {
            listings: std::sync::Mutex::new(std::collections::VecDeque::from([initial])),
            list_calls: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            events: std::sync::Mutex::new(Some(Vec::new())),
            hang_after_events: false,
            hang_listing: false,
            subscribe_allowed: true,
        }
    }

    /// Script the events delivered after subscription.
    pub fn events(self, events: Vec<Result<PodEvent, GateError>>) -> Self {
        *self.events.lock().expect("events lock") = Some(events);
        self
    }

    /// Keep the event stream open forever once the script is exhausted.
    pub fn hanging(mut self) -> Self {
        self.hang_after_events = true;
        self
    }

    /// Never answer a listing.
    pub fn hanging_listing(mut self) -> Self {
        self.hang_listing = true;
        self
    }

    /// Panic if the controller subscribes at all.
    pub fn forbid_subscribe(mut self) -> Self {
        self.subscribe_allowed = false;
        self
    }

    /// Queue a further listing served by the next `list` call.
    pub fn then_listing(self, pods: Vec<Pod>) -> Self {
        self.listings.lock().expect("listings lock").push_back(pods);
        self
    }

    /// Handle onto the listing counter, usable after the gate consumed
    /// the source.
    pub fn call_counter(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        self.list_calls.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl PodSource for FakePodSource {
    async fn list(&self) -> Result<PodSnapshot, GateError> {
        if self.hang_listing {
            futures::future::pending::<()>().await;
        }
        self.list_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let mut listings = self.listings.lock().expect("listings lock");
        let pods = if listings.len() > 1 {
            listings.pop_front().unwrap_or_default()
        } else {
            listings.front().cloned().unwrap_or_default()
        };

        Ok(PodSnapshot {
            pods,
            resource_version: "1".to_string(),
        })
    }

    async fn subscribe(&self, _resource_version: &str) -> Result<PodEventStream, GateError> {
        assert!(
            self.subscribe_allowed,
            "subscribe called although the initial listing already decided the gate"
        );

        let events = self
            .events
            .lock()
            .expect("events lock")
            .take()
            .unwrap_or_default();

        let scripted = futures::stream::iter(events);
        if self.hang_after_events {
            Ok(scripted.chain(futures::stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }
}
