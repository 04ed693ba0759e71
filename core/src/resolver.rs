//! Reverse DNS for responding hosts.
//!
//! Resolution is best effort: every failure, including a slow resolver,
//! yields `None` and the device keeps the `"unknown"` hostname.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub use sweepr_common::config::DEFAULT_DNS_TIMEOUT;

#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve_hostname(&self, ip: Ipv4Addr) -> Option<String>;
}

/// Reverse lookups through the system resolver.
///
/// `getnameinfo` blocks, so each lookup runs on tokio's blocking pool and is
/// abandoned after `timeout`.
#[derive(Debug, Clone, Copy)]
pub struct DnsResolver {
    timeout: Duration,
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DNS_TIMEOUT)
    }
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HostnameResolver for DnsResolver {
    async fn resolve_hostname(&self, ip: Ipv4Addr) -> Option<String> {
        let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&IpAddr::V4(ip)));

        let hostname: String = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(name))) => name,
            Ok(Ok(Err(e))) => {
                debug!(ip = %ip, "reverse lookup failed: {e}");
                return None;
            }
            Ok(Err(e)) => {
                debug!(ip = %ip, "reverse lookup task failed: {e}");
                return None;
            }
            Err(_) => {
                debug!(ip = %ip, "reverse lookup timed out after {:?}", self.timeout);
                return None;
            }
        };

        // getnameinfo falls back to the numeric form when no PTR record exists.
        normalize_hostname(ip, hostname)
    }
}

/// Resolver used when DNS is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl HostnameResolver for NoopResolver {
    async fn resolve_hostname(&self, _ip: Ipv4Addr) -> Option<String> {
        None
    }
}

fn normalize_hostname(ip: Ipv4Addr, hostname: String) -> Option<String> {
    let hostname = hostname.trim_end_matches('.');
    if hostname.is_empty() || hostname == ip.to_string() {
        return None;
    }
    Some(hostname.to_string())
}
