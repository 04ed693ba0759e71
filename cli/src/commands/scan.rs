use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, warn};

use crate::mprint;
use crate::terminal::{colors, print, progress};
use sweepr_common::config::{Config, ScanConfig};
use sweepr_common::network::device::{DeviceInfo, UNKNOWN_HOSTNAME};
use sweepr_common::network::subnet::{HOSTS_PER_SUBNET, SubnetBase};
use sweepr_common::{ScanError, success};
use sweepr_core::resolver::DnsResolver;
use sweepr_core::scanner::{self, SubnetScanner};

const IP_WIDTH: usize = 16;
const HOSTNAME_WIDTH: usize = 28;
const TIME_WIDTH: usize = 10;

pub async fn scan(subnet: Option<String>, scan_cfg: ScanConfig, cfg: &Config) -> anyhow::Result<()> {
    let subnet_base: SubnetBase = match subnet {
        Some(arg) => parse_subnet_arg(&arg)?,
        None => {
            let local_ip: Ipv4Addr = scanner::get_local_ip()?;
            if cfg.quiet < 2 {
                print::aligned_line("Local IP detected", local_ip.to_string().color(colors::IPV4_ADDR));
            }
            SubnetBase::from(local_ip)
        }
    };

    let start_time: Instant = Instant::now();
    let devices: Option<Vec<DeviceInfo>> = {
        let span = progress::scan_span(HOSTS_PER_SUBNET);
        let subnet_scanner = SubnetScanner::new(scan_cfg).on_progress(progress::reporter(&span));
        let subnet_scanner = if cfg.no_dns {
            subnet_scanner.without_dns()
        } else {
            subnet_scanner.with_resolver(Arc::new(DnsResolver::new(cfg.dns_timeout)))
        };

        let base: String = subnet_base.to_string();
        tokio::select! {
            result = subnet_scanner.scan_subnet(&base).instrument(span.clone()) => Some(result?),
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    let Some(mut devices) = devices else {
        warn!("scan interrupted, discarding partial results");
        return Ok(());
    };

    scan_ends(&mut devices, subnet_base, start_time.elapsed(), cfg);
    Ok(())
}

/// Accepts a subnet base (`192.168.1`) or any address inside the subnet.
fn parse_subnet_arg(arg: &str) -> Result<SubnetBase, ScanError> {
    match arg.parse::<SubnetBase>() {
        Ok(base) => Ok(base),
        Err(_) => scanner::extract_subnet(arg),
    }
}

fn scan_ends(devices: &mut [DeviceInfo], subnet_base: SubnetBase, total_time: Duration, cfg: &Config) {
    if devices.is_empty() {
        print::header("no active devices", cfg.quiet);
        if cfg.quiet == 0 {
            print::no_results();
        }
        print_summary(0, subnet_base, total_time, cfg);
        return;
    }

    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("active devices", cfg.quiet);
    devices.sort_by_key(|device| device.ip_address);
    if cfg.quiet < 2 {
        print_table(devices);
    }
    print_summary(devices.len(), subnet_base, total_time, cfg);
}

fn print_table(devices: &[DeviceInfo]) {
    print::table_row(&[
        print::cell("IP ADDRESS", IP_WIDTH, colors::SECONDARY),
        print::cell("HOSTNAME", HOSTNAME_WIDTH, colors::SECONDARY),
        print::cell("TIME", TIME_WIDTH, colors::SECONDARY),
        print::cell("STATUS", 0, colors::SECONDARY),
    ]);
    print::thin_separator();

    for device in devices {
        let hostname_color = match device.hostname.as_str() {
            UNKNOWN_HOSTNAME => colors::UNKNOWN,
            _ => colors::HOSTNAME,
        };
        let status: &str = if device.is_active { "active" } else { "inactive" };

        print::table_row(&[
            print::cell(&device.ip_address.to_string(), IP_WIDTH, colors::IPV4_ADDR),
            print::cell(&truncate(&device.hostname, HOSTNAME_WIDTH), HOSTNAME_WIDTH, hostname_color),
            print::cell(
                &format!("{:.2} ms", device.response_time_ms),
                TIME_WIDTH,
                colors::latency(device.response_time_ms),
            ),
            print::cell(status, 0, colors::ONLINE),
        ]);
    }
}

fn print_summary(active: usize, subnet_base: SubnetBase, total_time: Duration, cfg: &Config) {
    let active_devices: ColoredString = format!("{active}/{HOSTS_PER_SUBNET}").bold().green();
    let duration: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::aligned_line("Subnet", format!("{subnet_base}.0/24").color(colors::IPV4_ADDR));
            print::aligned_line("Active devices", active_devices);
            print::aligned_line("Scan duration", duration);
            print::fat_separator();
            print::centerln(&format!("{}", "Scan complete".color(colors::TEXT_DEFAULT)));
        }
        _ => {
            success!("{subnet_base}.0/24: {active_devices} active devices in {duration}");
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() < width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(2)).collect();
    short.push('…');
    short
}
