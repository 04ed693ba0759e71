use colored::*;

use crate::terminal::{colors, print};
use sweepr_common::config::Config;
use sweepr_common::network::subnet::{HOSTS_PER_SUBNET, SubnetBase};
use sweepr_common::success;
use sweepr_core::scanner;

pub fn local(cfg: &Config) -> anyhow::Result<()> {
    let local_ip = scanner::get_local_ip()?;
    let subnet_base = SubnetBase::from(local_ip);

    if cfg.quiet > 0 {
        success!("{local_ip} in {subnet_base}.0/24");
        return Ok(());
    }

    print::aligned_line("Local IP", local_ip.to_string().color(colors::IPV4_ADDR));
    print::aligned_line("Subnet base", subnet_base.to_string().color(colors::IPV4_ADDR));
    print::aligned_line("Scan range", format!("{}..{}", subnet_base.host(1), subnet_base.host(254)));
    print::aligned_line("Candidates", HOSTS_PER_SUBNET.to_string());
    Ok(())
}
