//! # /24 Subnet Arithmetic
//!
//! A scan always covers one /24 network. The network is identified by its
//! *subnet base*, the first three octets of any address inside it
//! (`192.168.1` for `192.168.1.100`). Host octets `0` and `255` are the
//! network and broadcast addresses and are never probed.

use std::fmt;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::str::FromStr;

use tracing::{error, info};

use crate::error::ScanError;

/// Host octets probed inside a /24.
pub const HOST_OCTETS: RangeInclusive<u8> = 1..=254;

/// Number of candidate hosts in a /24.
pub const HOSTS_PER_SUBNET: usize = 254;

/// The network portion of a /24 IPv4 subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubnetBase([u8; 3]);

impl SubnetBase {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    pub fn octets(&self) -> [u8; 3] {
        self.0
    }

    /// The address of `host` inside this subnet.
    pub fn host(&self, host: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, host)
    }

    /// All probe candidates, `.1` through `.254`, ascending.
    pub fn hosts(self) -> impl Iterator<Item = Ipv4Addr> {
        HOST_OCTETS.map(move |host| self.host(host))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        addr.octets()[..3] == self.0
    }
}

impl From<Ipv4Addr> for SubnetBase {
    fn from(addr: Ipv4Addr) -> Self {
        let [a, b, c, _] = addr.octets();
        Self([a, b, c])
    }
}

impl fmt::Display for SubnetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}")
    }
}

impl FromStr for SubnetBase {
    type Err = ScanError;

    /// Parses `"a.b.c"`: exactly three groups of one to three digits, each at most 255.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: [u8; 3] = parse_octets(s).ok_or(ScanError::InvalidSubnet)?;
        Ok(Self(octets))
    }
}

/// Returns the subnet base of a dotted-quad address.
///
/// The input must be four dot separated groups of one to three digits with
/// every octet in `0..=255`; anything else is [`ScanError::InvalidSubnet`].
/// Leading zeros do not survive: `"010.001.002.003"` yields `10.1.2`.
pub fn extract_subnet(ip_address: &str) -> Result<SubnetBase, ScanError> {
    let Some(octets) = parse_octets::<4>(ip_address) else {
        error!("invalid ip address format: {ip_address}");
        return Err(ScanError::InvalidSubnet);
    };

    let subnet_base = SubnetBase::from(Ipv4Addr::from(octets));
    info!("extracted subnet base: {subnet_base}");
    Ok(subnet_base)
}

/// Lists all 254 host addresses of the subnet named by `subnet_base`.
pub fn generate_subnet_ips(subnet_base: &str) -> Result<Vec<Ipv4Addr>, ScanError> {
    let base: SubnetBase = subnet_base.parse().inspect_err(|_| {
        error!("invalid subnet base format: {subnet_base}");
    })?;

    let ip_addresses: Vec<Ipv4Addr> = base.hosts().collect();
    info!(
        "generated {} ip addresses for subnet {base}",
        ip_addresses.len()
    );
    Ok(ip_addresses)
}

fn parse_octets<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut octets = [0u8; N];
    let mut parts = s.split('.');

    for octet in octets.iter_mut() {
        *octet = parse_octet(parts.next()?)?;
    }

    match parts.next() {
        Some(_) => None,
        None => Some(octets),
    }
}

fn parse_octet(part: &str) -> Option<u8> {
    let is_digits = (1..=3).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
    if !is_digits {
        return None;
    }
    // Three digits fit in u16, so only the 0..=255 bound can fail here.
    part.parse::<u16>().ok().and_then(|value| u8::try_from(value).ok())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
