mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, local, ping, scan};
use sweepr_common::ScanError;
use sweepr_common::config::Config;
use terminal::{logging, print};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose)?;

    let cfg: Config = commands.config();
    let scan_cfg = commands.scan_config();
    print::banner(cfg.no_banner, cfg.quiet);

    if !is_root::is_root() && !matches!(commands.command, Commands::Local) {
        warn!("not running as root: raw ICMP sockets need root or CAP_NET_RAW");
    }

    let outcome: anyhow::Result<()> = match commands.command {
        Commands::Scan { subnet } => {
            print::header("starting subnet scan", cfg.quiet);
            scan::scan(subnet, scan_cfg, &cfg).await
        }
        Commands::Ping { ip } => {
            print::header(&format!("pinging {ip}"), cfg.quiet);
            ping::ping(ip, scan_cfg, &cfg).await
        }
        Commands::Local => {
            print::header("local network", cfg.quiet);
            local::local(&cfg)
        }
    };

    match outcome {
        Ok(()) => {
            print::end_of_program(cfg.quiet);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.downcast_ref::<ScanError>() {
            Some(scan_err) => {
                print::scan_error(scan_err);
                Ok(ExitCode::from(u8::try_from(scan_err.exit_code()).unwrap_or(1)))
            }
            None => Err(err),
        },
    }
}
