//! Tests for the gate controller
//!
//! Driven entirely through the scripted pod source. Readiness comes
//! from the init-state strategy so no probe traffic is involved; pods
//! are made ready by giving them a running init container.

use super::*;
use crate::gate::source::{FakePodSource, PodEvent};
use crate::gate::strategy::InitStateStrategy;
use clap::Parser;
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateRunning, ContainerStatus, Pod, PodStatus,
};
use kube::api::ObjectMeta;
use kube::core::ErrorResponse;
use std::sync::atomic::Ordering;

fn config(args: &[&str]) -> Config {
    Config::try_parse_from(std::iter::once("portti").chain(args.iter().copied()))
        .expect("args should parse")
}

fn ready_pod(name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: None,
        status: Some(PodStatus {
            init_container_statuses: Some(vec![ContainerStatus {
                name: "init-0".to_string(),
                state: Some(ContainerState {
                    running: Some(ContainerStateRunning::default()),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

fn unready_pod(name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: None,
        status: None,
    }
}

fn gate(source: FakePodSource, config: &Config) -> Gate<FakePodSource> {
    Gate::new(source, Box::new(InitStateStrategy), config)
}

#[tokio::test]
async fn test_initial_listing_alone_can_open_the_gate() {
    let source = FakePodSource::new(vec![
        ready_pod("peer-0"),
        ready_pod("peer-1"),
        ready_pod("peer-2"),
    ])
    .forbid_subscribe();
    let calls = source.call_counter();
    let config = config(&["--mode", "watch", "-w", "3"]);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::Satisfied { ready: 3 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gate_opens_when_watch_events_reach_quorum() {
    let source = FakePodSource::new(vec![])
        .events(vec![
            Ok(PodEvent::Added(ready_pod("peer-0"))),
            Ok(PodEvent::Added(ready_pod("peer-1"))),
            Ok(PodEvent::Added(ready_pod("peer-2"))),
        ])
        .hanging();
    let config = config(&["--mode", "watch", "-w", "3"]);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::Satisfied { ready: 3 });
}

#[tokio::test]
async fn test_gate_times_out_with_partial_quorum() {
    let source =
        FakePodSource::new(vec![ready_pod("peer-0"), ready_pod("peer-1")]).hanging();
    let mut config = config(&["--mode", "watch", "-w", "3"]);
    config.timeout = Duration::from_millis(200);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::TimedOut { ready: 2 });
}

#[tokio::test]
async fn test_deleted_pods_stop_counting_toward_quorum() {
    let source = FakePodSource::new(vec![])
        .events(vec![
            Ok(PodEvent::Added(ready_pod("peer-0"))),
            Ok(PodEvent::Deleted(ready_pod("peer-0"))),
            Ok(PodEvent::Added(ready_pod("peer-1"))),
            Ok(PodEvent::Added(ready_pod("peer-2"))),
        ])
        .hanging();
    let config = config(&["--mode", "watch", "-w", "2"]);

    let outcome = gate(source, &config).run().await.expect("gate run");

    // peer-0 came and went; only peer-1 and peer-2 opened the gate
    assert_eq!(outcome, Outcome::Satisfied { ready: 2 });
}

#[tokio::test]
async fn test_readiness_can_be_revoked_before_quorum() {
    let source = FakePodSource::new(vec![ready_pod("peer-0")])
        .events(vec![
            Ok(PodEvent::Modified(unready_pod("peer-0"))),
            Ok(PodEvent::Added(ready_pod("peer-1"))),
        ])
        .hanging();
    let mut config = config(&["--mode", "watch", "-w", "2"]);
    config.timeout = Duration::from_millis(300);

    let outcome = gate(source, &config).run().await.expect("gate run");

    // peer-0 regressed before peer-1 arrived; the quorum never held
    assert_eq!(outcome, Outcome::TimedOut { ready: 1 });
}

#[tokio::test]
async fn test_watch_stream_error_aborts_the_wait() {
    let source = FakePodSource::new(vec![]).events(vec![Err(GateError::WatchStream(
        ErrorResponse {
            status: "Failure".to_string(),
            message: "too old resource version".to_string(),
            reason: "Expired".to_string(),
            code: 410,
        },
    ))]);
    let config = config(&["--mode", "watch", "-w", "3"]);

    let result = gate(source, &config).run().await;

    match result {
        Err(GateError::WatchStream(e)) => assert_eq!(e.code, 410),
        other => panic!("expected a fatal stream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_watch_stream_close_aborts_the_wait() {
    let source = FakePodSource::new(vec![ready_pod("peer-0")]);
    let config = config(&["--mode", "watch", "-w", "3"]);

    let result = gate(source, &config).run().await;

    assert!(matches!(result, Err(GateError::WatchClosed)));
}

#[tokio::test]
async fn test_poll_mode_sees_new_state_on_next_tick() {
    let source = FakePodSource::new(vec![unready_pod("peer-0")])
        .then_listing(vec![ready_pod("peer-0")]);
    let calls = source.call_counter();
    let mut config = config(&["--mode", "poll", "-w", "1"]);
    config.poll_interval = Duration::from_millis(50);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::Satisfied { ready: 1 });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_poll_mode_replaces_state_wholesale() {
    let source = FakePodSource::new(vec![ready_pod("peer-b")])
        .then_listing(vec![ready_pod("peer-a")])
        .then_listing(vec![ready_pod("peer-a"), ready_pod("peer-c")]);
    let calls = source.call_counter();
    let mut config = config(&["--mode", "poll", "-w", "2"]);
    config.poll_interval = Duration::from_millis(50);

    let outcome = gate(source, &config).run().await.expect("gate run");

    // peer-b vanished from the second listing; had it lingered in the
    // store, the second tick would already have counted two ready pods
    assert_eq!(outcome, Outcome::Satisfied { ready: 2 });
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_quorum_opens_immediately() {
    let source = FakePodSource::new(vec![]).forbid_subscribe();
    let config = config(&["--mode", "watch", "-w", "0"]);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::Satisfied { ready: 0 });
}

#[tokio::test]
async fn test_deadline_cuts_a_hung_initial_listing() {
    let source = FakePodSource::new(vec![]).hanging_listing();
    let mut config = config(&["--mode", "poll", "-w", "1"]);
    config.timeout = Duration::from_millis(200);

    let outcome = gate(source, &config).run().await.expect("gate run");

    assert_eq!(outcome, Outcome::TimedOut { ready: 0 });
}
