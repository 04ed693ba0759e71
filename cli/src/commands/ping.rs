use std::net::Ipv4Addr;

use colored::*;
use tracing::warn;

use crate::terminal::{colors, print};
use sweepr_common::config::{Config, ScanConfig};
use sweepr_common::network::device::PingResult;
use sweepr_common::{ScanError, success};
use sweepr_core::PingManager;

pub async fn ping(ip: Ipv4Addr, scan_cfg: ScanConfig, cfg: &Config) -> anyhow::Result<()> {
    let mut pinger = PingManager::new()
        .with_timeout(scan_cfg.timeout())
        .with_retry_count(scan_cfg.retry_count());

    let result: PingResult = tokio::select! {
        result = pinger.ping(ip) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("ping interrupted");
            return Ok(());
        }
    };

    if !result.success {
        warn!(
            "no reply from {ip}: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        );
        return Err(ScanError::TimeoutExceeded.into());
    }

    match cfg.quiet {
        0 => {
            print::aligned_line("Target", ip.to_string().color(colors::IPV4_ADDR));
            print::aligned_line(
                "Response time",
                format!("{:.3} ms", result.response_time_ms).color(colors::latency(result.response_time_ms)),
            );
            print::aligned_line("Attempts allowed", pinger.retry_count().to_string());
        }
        _ => success!("reply from {ip}: time={:.3} ms", result.response_time_ms),
    }
    Ok(())
}
