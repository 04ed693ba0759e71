#![cfg(test)]
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sweepr_common::ScanError;
use sweepr_core::ping::{ProbeState, ALL_ATTEMPTS_FAILED};
use sweepr_core::PingManager;

use crate::utils::{Behaviour, SimulatedNetwork};

const TARGET: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

fn pinger(network: SimulatedNetwork, timeout_ms: u64, retries: usize) -> PingManager<SimulatedNetwork> {
    PingManager::with_factory(Arc::new(network))
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_retry_count(retries)
}

#[tokio::test]
async fn ping_drop_all_waits_for_every_attempt() {
    let network = SimulatedNetwork::new();
    let stats = network.stats();
    let mut pinger = pinger(network, 50, 3);

    let start = Instant::now();
    let result = pinger.ping(TARGET).await.unwrap();
    let elapsed = start.elapsed();

    assert!(!result.success);
    assert_eq!(result.error_message.as_deref(), Some(ALL_ATTEMPTS_FAILED));
    assert_eq!(result.response_time_ms, 0.0);
    assert_eq!(stats.sent(), 3);
    assert!(elapsed >= Duration::from_millis(140), "gave up after {elapsed:?}");
    assert_eq!(pinger.state(), ProbeState::TimedOut);
}

#[tokio::test]
async fn ping_ignores_stale_sequence_numbers() {
    let network = SimulatedNetwork::new().with(TARGET, Behaviour::StaleThenReply);
    let stats = network.stats();
    let mut pinger = pinger(network, 200, 1);

    let result = pinger.ping(TARGET).await.unwrap();

    assert!(result.success);
    assert_eq!(stats.sent(), 1);
}

#[tokio::test]
async fn ping_retries_after_unreachable() {
    let network = SimulatedNetwork::new().with(TARGET, Behaviour::Unreachable);
    let stats = network.stats();
    let mut pinger = pinger(network, 1_000, 2);

    let start = Instant::now();
    let result = pinger.ping(TARGET).await.unwrap();

    assert!(!result.success);
    assert_eq!(stats.sent(), 2);
    // ICMP errors end an attempt without waiting for the deadline.
    assert!(start.elapsed() < Duration::from_millis(1_000));
    assert_eq!(pinger.state(), ProbeState::Failed);
}

#[tokio::test]
async fn ping_reuses_its_socket() {
    let network = SimulatedNetwork::new().reply(TARGET);
    let stats = network.stats();
    let mut pinger = pinger(network, 100, 1);

    for _ in 0..3 {
        assert!(pinger.ping(TARGET).await.unwrap().success);
    }
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.sent(), 3);
}

#[tokio::test]
async fn ping_without_privilege_is_permission_denied() {
    let mut pinger = pinger(SimulatedNetwork::without_privilege(), 100, 1);
    assert_eq!(pinger.ping(TARGET).await, Err(ScanError::PermissionDenied));
    assert_eq!(pinger.state(), ProbeState::Idle);
}

/// Real raw socket round trip to the loopback interface.
#[tokio::test]
async fn ping_loopback() {
    let mut pinger = PingManager::new()
        .with_timeout(Duration::from_millis(1_000))
        .with_retry_count(2);

    match pinger.ping(Ipv4Addr::LOCALHOST).await {
        Ok(result) => {
            assert!(result.success, "{:?}", result.error_message);
            assert!(result.response_time_ms > 0.0);
        }
        Err(err) => assert!(
            matches!(err, ScanError::PermissionDenied | ScanError::SystemError),
            "unexpected error {err:?}"
        ),
    }
}
