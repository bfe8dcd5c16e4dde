//! Readiness gate core
//!
//! The gate tracks sibling pod readiness from a live Kubernetes view and
//! decides between two terminal outcomes: the quorum was reached, or the
//! deadline fired first. Acquisition (poll vs. watch) and per-pod
//! readiness determination (HTTP probe vs. init container state) are
//! pluggable; the decision loop is shared.

pub mod controller;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod strategy;

pub use controller::{Gate, Outcome};
pub use source::{KubePodSource, PodEvent, PodSnapshot, PodSource};
pub use store::PodStore;
pub use strategy::{select_strategy, ReadinessStrategy};

use thiserror::Error;

/// Fatal gate failures
///
/// Everything here means the pod source can no longer be trusted and the
/// process must exit non-zero; the caller restarts it from scratch.
/// Transient per-pod probe failures are not errors - they mark the pod
/// unready and the wait continues.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to list pods: {0}")]
    List(#[source] kube::Error),

    #[error("Failed to start pod watch: {0}")]
    WatchInit(#[source] kube::Error),

    #[error("Pod watch transport failed: {0}")]
    Watch(#[source] kube::Error),

    #[error("Pod watch stream reported an error: {0}")]
    WatchStream(kube::core::ErrorResponse),

    #[error("Pod watch stream closed before the quorum was reached")]
    WatchClosed,
}
