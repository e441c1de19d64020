//! Discover subcommand implementation.

use crate::config::AppSettings;
use crate::discovery::{Discovery, HostRange, Platform};
use crate::error::CliResult;
use crate::output;
use crate::report::DiscoveryReport;
use clap::Parser;
use std::path::PathBuf;

/// Discover live devices in a network.
#[derive(Parser, Debug)]
pub struct DiscoverCommand {
    /// Network to sweep: CIDR (192.168.1.0/24), address, or 10.0.0.1-50
    #[arg(short, long)]
    pub target: String,

    /// Maximum number of simultaneous probes
    #[arg(long)]
    pub workers: Option<usize>,

    /// Probe timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Where to write the device list
    #[arg(long, default_value = "discovery.json")]
    pub save: PathBuf,
}

impl DiscoverCommand {
    /// Execute the discover command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let workers = self.workers.unwrap_or(settings.discovery_workers);
        let timeout_ms = self.timeout.unwrap_or(settings.discovery_timeout_ms);

        if !quiet {
            let addresses = HostRange::parse(&self.target).map_or(0, |range| range.len());
            output::print_discovery_header(&self.target, addresses);
        }

        let discovery =
            Discovery::system(Platform::current(), workers, timeout_ms).with_progress(!quiet);
        let devices = discovery.discover(&self.target).await;

        if !quiet {
            output::print_hosts(&devices)?;
        }

        DiscoveryReport::new(&self.target, devices).save(&self.save)?;

        if !quiet {
            output::print_success(&format!("Saved {}", self.save.display()));
        }
        Ok(())
    }
}
