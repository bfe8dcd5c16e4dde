//! Last-known readiness per pod
//!
//! The store is a plain map owned by the gate controller; no locking,
//! because exactly one consumer mutates it. A ready counter is adjusted
//! on every mutation so the quorum check never rescans the map.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct PodStore {
    pods: BTreeMap<String, bool>,
    ready: usize,
}

impl PodStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest readiness determination for a pod.
    ///
    /// Re-recording the same value is a no-op; flips adjust the ready
    /// counter by exactly one in either direction.
    pub fn upsert(&mut self, name: impl Into<String>, ready: bool) {
        let previous = self.pods.insert(name.into(), ready);
        match (previous, ready) {
            (Some(false) | None, true) => self.ready += 1,
            (Some(true), false) => self.ready -= 1,
            _ => {}
        }
    }

    /// Drop a pod entirely. A deleted pod contributes nothing to any
    /// count; removing an unknown pod is a no-op.
    pub fn remove(&mut self, name: &str) {
        if self.pods.remove(name) == Some(true) {
            self.ready -= 1;
        }
    }

    /// Number of pods currently considered ready.
    pub fn ready_count(&self) -> usize {
        self.ready
    }

    /// Number of pods tracked, ready or not.
    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }
}
