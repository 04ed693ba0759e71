#![cfg(test)]
use std::net::Ipv4Addr;
use std::time::Duration;

use sweepr_common::config::ScanConfig;
use sweepr_common::network::device::DeviceInfo;
use sweepr_common::ScanError;
use sweepr_core::scanner::SubnetScanner;

use crate::utils::{Behaviour, SimulatedNetwork};

fn host(d: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, d)
}

fn three_responders() -> SimulatedNetwork {
    SimulatedNetwork::new()
        .reply(host(5))
        .reply(host(9))
        .reply(host(200))
}

fn sorted_ips(devices: &[DeviceInfo]) -> Vec<Ipv4Addr> {
    let mut ips: Vec<Ipv4Addr> = devices.iter().map(|d| d.ip_address).collect();
    ips.sort();
    ips
}

/// Every batch size finds exactly the responding hosts.
#[tokio::test]
async fn discovery_finds_responders_for_any_batch_size() {
    for max_concurrent in [1, 10, 254] {
        let network = three_responders();
        let stats = network.stats();
        let config = ScanConfig::new(Duration::from_millis(10), max_concurrent, 1);
        let scanner = SubnetScanner::with_factory(network, config).without_dns();

        let devices = scanner.scan_subnet("192.168.1").await.unwrap();

        assert_eq!(
            sorted_ips(&devices),
            vec![host(5), host(9), host(200)],
            "max_concurrent {max_concurrent}"
        );
        assert!(devices.iter().all(|d| d.is_active && d.hostname == "unknown"));
        assert_eq!(stats.sent(), 254, "one probe per candidate");
        // One preflight socket plus one per probe.
        assert_eq!(stats.opened(), 255);
    }
}

#[tokio::test]
async fn discovery_measures_response_time() {
    let network = SimulatedNetwork::new().reply_after(host(20), Duration::from_millis(30));
    let config = ScanConfig::new(Duration::from_millis(500), 254, 1);
    let scanner = SubnetScanner::with_factory(network, config).without_dns();

    let devices = scanner.scan_subnet("192.168.1").await.unwrap();

    assert_eq!(devices.len(), 1);
    assert!(
        devices[0].response_time_ms >= 30.0,
        "measured {} ms",
        devices[0].response_time_ms
    );
}

#[tokio::test]
async fn discovery_ignores_replies_after_the_timeout() {
    let network = SimulatedNetwork::new()
        .reply_after(host(7), Duration::from_millis(5))
        .reply_after(host(8), Duration::from_millis(300));
    let config = ScanConfig::new(Duration::from_millis(60), 254, 1);
    let scanner = SubnetScanner::with_factory(network, config).without_dns();

    let devices = scanner.scan_subnet("192.168.1").await.unwrap();

    assert_eq!(sorted_ips(&devices), vec![host(7)]);
}

#[tokio::test]
async fn discovery_skips_unreachable_and_stale_replies() {
    let network = SimulatedNetwork::new()
        .with(host(1), Behaviour::Unreachable)
        .with(host(2), Behaviour::StaleThenReply)
        .reply(host(3));
    let config = ScanConfig::new(Duration::from_millis(10), 50, 2);
    let scanner = SubnetScanner::with_factory(network, config).without_dns();

    let devices = scanner.scan_subnet("192.168.1").await.unwrap();

    assert_eq!(sorted_ips(&devices), vec![host(2), host(3)]);
}

#[tokio::test]
async fn discovery_without_responders_is_empty() {
    let config = ScanConfig::new(Duration::from_millis(5), 254, 1);
    let scanner = SubnetScanner::with_factory(SimulatedNetwork::new(), config).without_dns();

    assert_eq!(scanner.scan_subnet("10.1.2").await, Ok(Vec::new()));
}

#[tokio::test]
async fn discovery_rejects_invalid_subnets() {
    let network = three_responders();
    let stats = network.stats();
    let scanner = SubnetScanner::with_factory(network, ScanConfig::default()).without_dns();

    for base in ["192.168", "192.168.1.1", "192.168.abc", "256.1.1"] {
        assert_eq!(
            scanner.scan_subnet(base).await,
            Err(ScanError::InvalidSubnet),
            "base {base:?}"
        );
    }
    assert_eq!(stats.sent(), 0);
}

#[tokio::test]
async fn discovery_without_privilege_is_permission_denied() {
    let network = SimulatedNetwork::without_privilege();
    let stats = network.stats();
    let scanner = SubnetScanner::with_factory(network, ScanConfig::default()).without_dns();

    assert_eq!(
        scanner.scan_subnet("192.168.1").await,
        Err(ScanError::PermissionDenied)
    );
    assert_eq!(stats.sent(), 0);
}

#[tokio::test]
async fn discovery_survives_one_failed_socket() {
    // Call 1 is the preflight; call 152 falls in the batch .151 to .160.
    let network = three_responders().fail_open_call(152);
    let stats = network.stats();
    let config = ScanConfig::new(Duration::from_millis(10), 10, 1);
    let scanner = SubnetScanner::with_factory(network, config).without_dns();

    let devices = scanner.scan_subnet("192.168.1").await.unwrap();

    assert_eq!(sorted_ips(&devices), vec![host(5), host(9), host(200)]);
    assert_eq!(stats.opened(), 254, "preflight plus 253 probes");
    assert_eq!(stats.sent(), 253);
}

/// Scans the loopback /24 over real raw sockets.
///
/// Every address in 127.0.0.0/24 answers, so each batch size must find all
/// 254 hosts. Without raw socket privileges the scan must fail up front.
/// Sandboxes without raw ICMP support report a `SystemError` instead.
#[tokio::test]
async fn discovery_loopback_raw_sockets() {
    for max_concurrent in [1, 10, 254] {
        let config = ScanConfig::new(Duration::from_millis(1_000), max_concurrent, 1);
        let scanner = SubnetScanner::new(config).without_dns();

        match scanner.scan_subnet("127.0.0").await {
            Ok(devices) => {
                assert_eq!(devices.len(), 254, "max_concurrent {max_concurrent}");
                assert!(devices
                    .iter()
                    .all(|d| d.ip_address.octets()[..3] == [127, 0, 0] && d.is_active));
                assert!(devices.iter().all(|d| d.response_time_ms > 0.0));
            }
            Err(err) => {
                assert!(
                    matches!(err, ScanError::PermissionDenied | ScanError::SystemError),
                    "unexpected error {err:?}"
                );
                return;
            }
        }
    }
}
