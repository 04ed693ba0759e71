pub mod local;
pub mod ping;
pub mod scan;

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use sweepr_common::config::{
    Config, DEFAULT_DNS_TIMEOUT, DEFAULT_MAX_CONCURRENT, DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT,
    ScanConfig,
};

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(version)]
#[command(about = "Concurrent ICMP host discovery for /24 networks.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reply timeout per attempt, in milliseconds
    #[arg(short, long, global = true, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout: u64,

    /// Number of hosts probed at the same time
    #[arg(short, long, global = true, default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub concurrency: usize,

    /// Echo requests sent per host before giving up
    #[arg(short, long, global = true, default_value_t = DEFAULT_RETRY_COUNT)]
    pub retries: usize,

    /// Skip reverse DNS lookups
    #[arg(long, global = true)]
    pub no_dns: bool,

    /// Reverse DNS timeout per host, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_DNS_TIMEOUT.as_millis() as u64)]
    pub dns_timeout: u64,

    /// Skip the startup banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Less output (-q drops decorations, -qq prints only the summary)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover active hosts on a /24 network
    #[command(alias = "s")]
    Scan {
        /// Subnet base (192.168.1) or any address inside it; defaults to the local network
        subnet: Option<String>,
    },
    /// Probe a single host
    #[command(alias = "p")]
    Ping { ip: Ipv4Addr },
    /// Show the local address and the network a scan would cover
    #[command(alias = "l")]
    Local,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            no_banner: self.no_banner,
            no_dns: self.no_dns,
            dns_timeout: Duration::from_millis(self.dns_timeout),
            quiet: self.quiet,
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(
            Duration::from_millis(self.timeout),
            self.concurrency,
            self.retries,
        )
    }
}
