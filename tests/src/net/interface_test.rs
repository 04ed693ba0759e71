use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::{MacAddr, NetworkInterface};
use sweepr_common::ScanError;
use sweepr_core::discovery::{interface_addresses, select_routable};

use crate::utils::{ni, v4, v6};

const IFF_UP_RUNNING: u32 = 69699;
const IFF_DOWN: u32 = 4098;

/*************************************************************
                 Tests for local ip selection
**************************************************************/

#[test]
fn selects_first_routable_ipv4() {
    let interfaces: Vec<NetworkInterface> = iface_all();
    let local_ip = select_routable(interface_addresses(&interfaces));
    assert_eq!(local_ip, Ok(Ipv4Addr::new(192, 168, 1, 100)));
}

#[test]
fn skips_interfaces_that_are_down() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), eth1_down(), wlan0()];
    let local_ip = select_routable(interface_addresses(&interfaces));
    assert_eq!(local_ip, Ok(Ipv4Addr::new(10, 0, 0, 23)));
}

#[test]
fn loopback_and_link_local_only_is_an_error() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), ipv6only0(), linklocal0()];
    let selected = select_routable(interface_addresses(&interfaces));
    assert_eq!(selected, Err(ScanError::NetworkInterfaceError));
}

#[test]
fn addresses_keep_interface_order() {
    let addresses: Vec<IpAddr> = interface_addresses(&[enp9s0(), lo()]);
    assert_eq!(addresses.len(), 4);
    assert_eq!(addresses[0], IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
    assert_eq!(addresses[2], IpAddr::V4(Ipv4Addr::LOCALHOST));
}

/*************************************************************
                  Mock interfaces for testing
**************************************************************/

fn iface_all() -> Vec<NetworkInterface> {
    vec![lo(), linklocal0(), ipv6only0(), enp9s0(), wlan0()]
}

fn lo() -> NetworkInterface {
    ni(
        "lo",
        1,
        Some(MacAddr::new(0, 0, 0, 0, 0, 0)),
        &[v4(127, 0, 0, 1, 8), v6("::1", 128)],
        65609,
    )
}

fn enp9s0() -> NetworkInterface {
    ni(
        "enp9s0",
        2,
        Some(MacAddr::new(0x3c, 0x7c, 0x3f, 0x1a, 0x2b, 0x3c)),
        &[v4(192, 168, 1, 100, 24), v6("fe80::3e7c:3fff:fe1a:2b3c", 64)],
        IFF_UP_RUNNING,
    )
}

fn wlan0() -> NetworkInterface {
    ni(
        "wlan0",
        3,
        Some(MacAddr::new(0xa4, 0xc3, 0xf0, 0x85, 0x10, 0x01)),
        &[v4(10, 0, 0, 23, 24)],
        IFF_UP_RUNNING,
    )
}

fn eth1_down() -> NetworkInterface {
    ni(
        "eth1",
        4,
        Some(MacAddr::new(0x00, 0x1b, 0x21, 0x3a, 0x4b, 0x5c)),
        &[v4(172, 16, 0, 9, 16)],
        IFF_DOWN,
    )
}

fn ipv6only0() -> NetworkInterface {
    ni(
        "ipv6only0",
        5,
        None,
        &[v6("2001:db8::10", 64)],
        IFF_UP_RUNNING,
    )
}

fn linklocal0() -> NetworkInterface {
    ni(
        "linklocal0",
        6,
        Some(MacAddr::new(0x02, 0x42, 0xac, 0x11, 0x00, 0x02)),
        &[v4(169, 254, 12, 7, 16)],
        IFF_UP_RUNNING,
    )
}
