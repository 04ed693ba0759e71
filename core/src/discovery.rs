//! # Local Network Discovery
//!
//! Determines which IPv4 address identifies this machine on the local network,
//! and therefore which /24 a scan without an explicit subnet covers.

use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::{self, NetworkInterface};
use tracing::{debug, error, info};

use sweepr_common::ScanError;

/// Returns the first routable IPv4 address of this machine.
///
/// Candidates are the addresses the local hostname resolves to, followed by
/// the addresses of every interface that is up. Loopback and link-local
/// (`169.254.0.0/16`) addresses never qualify.
pub fn get_local_ip() -> Result<Ipv4Addr, ScanError> {
    let mut candidates: Vec<IpAddr> = hostname_addresses();
    candidates.extend(interface_addresses(&datalink::interfaces()));

    let local_ip = select_routable(candidates).inspect_err(|_| {
        error!("no routable ipv4 address found on any interface");
    })?;
    info!("local ip detected: {local_ip}");
    Ok(local_ip)
}

/// Picks the first IPv4 candidate that is neither loopback nor link-local.
pub fn select_routable<I>(candidates: I) -> Result<Ipv4Addr, ScanError>
where
    I: IntoIterator<Item = IpAddr>,
{
    candidates
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .find(is_routable)
        .ok_or(ScanError::NetworkInterfaceError)
}

fn is_routable(addr: &Ipv4Addr) -> bool {
    !addr.is_loopback() && !addr.is_link_local() && !addr.is_unspecified()
}

fn hostname_addresses() -> Vec<IpAddr> {
    let hostname: String = match dns_lookup::get_hostname() {
        Ok(name) => name,
        Err(e) => {
            debug!("could not read the local hostname: {e}");
            return Vec::new();
        }
    };

    dns_lookup::lookup_host(&hostname).unwrap_or_else(|e| {
        debug!("could not resolve local hostname {hostname}: {e}");
        Vec::new()
    })
}

/// Addresses of every interface that is up, in interface order.
pub fn interface_addresses(interfaces: &[NetworkInterface]) -> Vec<IpAddr> {
    interfaces
        .iter()
        .filter(|intf| intf.is_up())
        .flat_map(|intf| intf.ips.iter().map(|net| net.ip()))
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
