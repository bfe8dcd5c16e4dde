//! The blocking wait-and-decide loop
//!
//! Composes the pod source, reconciliation and the quorum check into a
//! single sequential consumer racing a one-shot deadline. Exactly one
//! terminal outcome fires per run: Satisfied or TimedOut; fatal source
//! failures abort with an error instead.

use futures::StreamExt;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{self, Sleep};
use tracing::{debug, info};

use crate::config::{AcquireMode, Config};

use super::reconcile::{apply_event, seed_store};
use super::source::PodSource;
use super::store::PodStore;
use super::strategy::ReadinessStrategy;
use super::GateError;

/// Terminal gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Enough pods were ready before the deadline
    Satisfied { ready: usize },
    /// The deadline fired first
    TimedOut { ready: usize },
}

/// The readiness gate. Owns all mutable wait state; construct one per
/// process run.
pub struct Gate<S> {
    source: S,
    strategy: Box<dyn ReadinessStrategy>,
    store: PodStore,
    quorum: usize,
    mode: AcquireMode,
    timeout: Duration,
    poll_interval: Duration,
}

impl<S: PodSource> Gate<S> {
    pub fn new(source: S, strategy: Box<dyn ReadinessStrategy>, config: &Config) -> Self {
        Self {
            source,
            strategy,
            store: PodStore::new(),
            quorum: config.wait_for,
            mode: config.mode,
            timeout: config.timeout,
            poll_interval: config.poll_interval,
        }
    }

    fn quorum_met(&self) -> bool {
        self.store.ready_count() >= self.quorum
    }

    fn satisfied(&self) -> Outcome {
        Outcome::Satisfied {
            ready: self.store.ready_count(),
        }
    }

    fn timed_out(&self) -> Outcome {
        Outcome::TimedOut {
            ready: self.store.ready_count(),
        }
    }

    /// Block until the quorum is met or the deadline fires.
    ///
    /// The deadline is armed once, before the initial listing, and is
    /// never reset; it can cut the wait short at any point. Source
    /// failures (listing, watch) abort with an error. Transient per-pod
    /// probe failures never do: they mark the pod unready and the wait
    /// continues.
    pub async fn run(mut self) -> Result<Outcome, GateError> {
        let deadline = time::sleep(self.timeout);
        tokio::pin!(deadline);

        let snapshot = tokio::select! {
            _ = deadline.as_mut() => return Ok(self.timed_out()),
            listing = self.source.list() => listing?,
        };
        let resource_version = snapshot.resource_version.clone();

        seed_store(&mut self.store, self.strategy.as_ref(), snapshot.pods).await;
        info!(
            ready = self.store.ready_count(),
            tracked = self.store.len(),
            quorum = self.quorum,
            "Seeded pod state from initial listing"
        );

        // The initial listing alone may already decide the gate
        if self.quorum_met() {
            return Ok(self.satisfied());
        }

        match self.mode {
            AcquireMode::Watch => self.run_watch(deadline, &resource_version).await,
            AcquireMode::Poll => self.run_poll(deadline).await,
        }
    }

    async fn run_watch(
        mut self,
        mut deadline: Pin<&mut Sleep>,
        resource_version: &str,
    ) -> Result<Outcome, GateError> {
        let mut events = tokio::select! {
            _ = deadline.as_mut() => return Ok(self.timed_out()),
            subscription = self.source.subscribe(resource_version) => subscription?,
        };

        loop {
            tokio::select! {
                _ = deadline.as_mut() => return Ok(self.timed_out()),
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        apply_event(&mut self.store, self.strategy.as_ref(), event).await;
                        debug!(
                            ready = self.store.ready_count(),
                            quorum = self.quorum,
                            "Applied pod event"
                        );
                        if self.quorum_met() {
                            return Ok(self.satisfied());
                        }
                    }
                    Some(Err(e)) => return Err(e),
                    // Without the subscription every later decision would
                    // rest on stale state
                    None => return Err(GateError::WatchClosed),
                },
            }
        }
    }

    async fn run_poll(mut self, mut deadline: Pin<&mut Sleep>) -> Result<Outcome, GateError> {
        let mut tick = time::interval_at(
            time::Instant::now() + self.poll_interval,
            self.poll_interval,
        );

        loop {
            tokio::select! {
                _ = deadline.as_mut() => return Ok(self.timed_out()),
                _ = tick.tick() => {
                    let snapshot = self.source.list().await?;
                    // Wholesale replacement: pods that vanished between
                    // ticks drop out with no tombstone
                    self.store = PodStore::new();
                    seed_store(&mut self.store, self.strategy.as_ref(), snapshot.pods).await;
                    debug!(
                        ready = self.store.ready_count(),
                        tracked = self.store.len(),
                        quorum = self.quorum,
                        "Re-listed pods"
                    );
                    if self.quorum_met() {
                        return Ok(self.satisfied());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
