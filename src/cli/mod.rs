//! CLI subcommand definitions and handlers.
//!
//! - `reconlab scan -t <target>` - connect scan, banners, CVE hints, report
//! - `reconlab discover -t <network>` - liveness sweep with MAC addresses

mod discover;
mod scan;

pub use discover::DiscoverCommand;
pub use scan::ScanCommand;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// reconlab - host discovery and connect scanning for lab networks.
#[derive(Parser, Debug)]
#[command(name = "reconlab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discover hosts, scan ports and grab banners", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target for open ports and write a report
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Discover live devices in a network
    #[command(alias = "d")]
    Discover(DiscoverCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_args() {
        let cli = Cli::try_parse_from([
            "reconlab", "scan", "-t", "10.0.0.1", "-p", "20-22", "--concurrency", "50",
            "--timeout", "0.5", "--save", "out.md",
        ])
        .unwrap();
        let Commands::Scan(cmd) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(cmd.target, "10.0.0.1");
        assert_eq!(cmd.ports.as_deref(), Some("20-22"));
        assert_eq!(cmd.concurrency, Some(50));
        assert_eq!(cmd.timeout, Some(0.5));
        assert_eq!(cmd.save, PathBuf::from("out.md"));
        assert!(!cmd.fast);
    }

    #[test]
    fn test_scan_defaults() {
        let cli = Cli::try_parse_from(["reconlab", "scan", "--target", "example.com", "--fast"])
            .unwrap();
        let Commands::Scan(cmd) = cli.command else {
            panic!("expected scan");
        };
        assert!(cmd.fast);
        assert_eq!(cmd.save, PathBuf::from("report.json"));
        assert_eq!(cmd.rate, 0);
    }

    #[test]
    fn test_discover_args() {
        let cli = Cli::try_parse_from(["reconlab", "-q", "discover", "-t", "192.168.1.0/24"])
            .unwrap();
        assert!(cli.quiet);
        let Commands::Discover(cmd) = cli.command else {
            panic!("expected discover");
        };
        assert_eq!(cmd.target, "192.168.1.0/24");
        assert_eq!(cmd.save, PathBuf::from("discovery.json"));
    }

    #[test]
    fn test_target_required() {
        assert!(Cli::try_parse_from(["reconlab", "scan"]).is_err());
    }
}
