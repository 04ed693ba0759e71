//! # Subnet Scanner
//!
//! Probes every host of a /24 and aggregates the responders.
//!
//! Candidates are processed in consecutive batches of `max_concurrent`. Every
//! probe of a batch runs as its own task with its own [`PingManager`] (and so
//! its own socket); the whole batch, slowest member included, finishes before
//! the next one starts. Dropping the scan future drops the running batch,
//! which aborts its probes and closes their sockets.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use sweepr_common::ScanError;
use sweepr_common::config::ScanConfig;
use sweepr_common::network::device::{DeviceInfo, PingResult};
use sweepr_common::success;

pub use crate::discovery::get_local_ip;
pub use sweepr_common::network::subnet::{extract_subnet, generate_subnet_ips};

use crate::ping::PingManager;
use crate::resolver::{DnsResolver, HostnameResolver, NoopResolver};
use crate::transport::{RawSocketFactory, TransportFactory};

/// Completed probes between two progress log lines.
pub const PROGRESS_INTERVAL: usize = 50;

/// Snapshot handed to the progress callback after every completed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    pub discovered: usize,
}

pub type ProgressCallback = Arc<dyn Fn(ScanProgress) + Send + Sync>;

pub struct SubnetScanner<F: TransportFactory = RawSocketFactory> {
    factory: Arc<F>,
    resolver: Arc<dyn HostnameResolver>,
    config: ScanConfig,
    on_progress: Option<ProgressCallback>,
}

impl SubnetScanner<RawSocketFactory> {
    /// A scanner using raw ICMP sockets and the system resolver.
    pub fn new(config: ScanConfig) -> Self {
        Self::with_factory(RawSocketFactory, config)
    }
}

impl<F: TransportFactory> SubnetScanner<F> {
    pub fn with_factory(factory: F, config: ScanConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            resolver: Arc::new(DnsResolver::default()),
            config,
            on_progress: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostnameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Skips reverse lookups; every device keeps the hostname `"unknown"`.
    pub fn without_dns(self) -> Self {
        self.with_resolver(Arc::new(NoopResolver))
    }

    pub fn on_progress(mut self, callback: impl Fn(ScanProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.set_timeout(timeout);
    }

    pub fn set_max_concurrent(&mut self, max_concurrent: usize) {
        self.config.set_max_concurrent(max_concurrent);
    }

    pub fn set_retry_count(&mut self, retry_count: usize) {
        self.config.set_retry_count(retry_count);
    }

    /// A ping manager carrying this scanner's timeout and retry settings.
    pub fn ping_manager(&self) -> PingManager<F> {
        PingManager::with_factory(Arc::clone(&self.factory))
            .with_timeout(self.config.timeout())
            .with_retry_count(self.config.retry_count())
    }

    /// Scans `base.1 ..= base.254` and returns the hosts that answered.
    ///
    /// Devices come back in discovery order. A malformed `subnet_base` fails
    /// with [`ScanError::InvalidSubnet`] and a missing raw socket privilege
    /// with [`ScanError::PermissionDenied`], both before any probe is sent.
    /// Any other socket failure of a single probe counts that host as down.
    pub async fn scan_subnet(&self, subnet_base: &str) -> Result<Vec<DeviceInfo>, ScanError> {
        let targets: Vec<Ipv4Addr> = generate_subnet_ips(subnet_base)?;

        // Preflight: surface privilege problems once, not from 254 probes.
        drop(self.factory.open()?);

        let total: usize = targets.len();
        let batch_size: usize = self.config.max_concurrent();
        info!(
            "scanning {total} hosts in {subnet_base}.0/24, {batch_size} at a time, timeout {:?}, {} attempt(s)",
            self.config.timeout(),
            self.config.retry_count()
        );

        let mut devices: Vec<DeviceInfo> = Vec::new();
        let mut completed: usize = 0;

        for batch in targets.chunks(batch_size) {
            let mut probes: JoinSet<(Ipv4Addr, Result<PingResult, ScanError>)> = JoinSet::new();
            for &ip in batch {
                let mut pinger = self.ping_manager();
                probes.spawn(async move { (ip, pinger.ping(ip).await) });
            }

            let mut responders: Vec<DeviceInfo> = Vec::new();
            while let Some(joined) = probes.join_next().await {
                let result: PingResult = match joined {
                    Ok((_, Ok(result))) => result,
                    Ok((_, Err(ScanError::PermissionDenied))) => {
                        return Err(ScanError::PermissionDenied);
                    }
                    Ok((ip, Err(e))) => {
                        // Exhausted descriptors or buffers only cost this one host.
                        warn!(ip = %ip, "no socket for probe, counting host as down: {e}");
                        PingResult::failed(ip, e.to_string())
                    }
                    Err(e) => {
                        error!("ping task failed: {e}");
                        return Err(ScanError::SystemError);
                    }
                };

                completed += 1;
                if let Some(device) = DeviceInfo::from_ping(&result) {
                    debug!(
                        "host {} is up ({:.2} ms)",
                        device.ip_address, device.response_time_ms
                    );
                    responders.push(device);
                }

                if completed % PROGRESS_INTERVAL == 0 {
                    info!("ping progress: {completed}/{total}");
                }
                self.report(ScanProgress {
                    completed,
                    total,
                    discovered: devices.len() + responders.len(),
                });
            }

            devices.extend(self.resolve_hostnames(responders).await);
        }

        success!("scan complete: {}/{total} hosts responded", devices.len());
        Ok(devices)
    }

    /// Resolves all hostnames of one batch concurrently, keeping device order.
    async fn resolve_hostnames(&self, devices: Vec<DeviceInfo>) -> Vec<DeviceInfo> {
        let mut lookups: JoinSet<(usize, Option<String>)> = JoinSet::new();
        for (index, device) in devices.iter().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let ip: Ipv4Addr = device.ip_address;
            lookups.spawn(async move { (index, resolver.resolve_hostname(ip).await) });
        }

        let mut hostnames: Vec<Option<String>> = vec![None; devices.len()];
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, hostname)) => hostnames[index] = hostname,
                Err(e) => warn!("hostname lookup task failed: {e}"),
            }
        }

        devices
            .into_iter()
            .zip(hostnames)
            .map(|(device, hostname)| device.with_hostname(hostname))
            .collect()
    }

    fn report(&self, progress: ScanProgress) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
