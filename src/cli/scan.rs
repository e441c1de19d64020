//! Scan subcommand implementation.
//!
//! Runs the pipeline for one target: connect scan, banner grab, CVE lookup,
//! summaries, report. Only the final report write can fail the command.

use crate::banner::BannerGrabber;
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::limiter::ConcurrencyLimiter;
use crate::output;
use crate::report::ScanReport;
use crate::scanner::PortScanner;
use crate::summary::select_summarizer;
use crate::types::{parse_ports, PortSpec, Target};
use crate::vuln::{CirclLookup, OfflineLookup, VulnLookup};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Scan a target for open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target hostname, IP address or URL
    #[arg(short, long)]
    pub target: String,

    /// Ports to scan (e.g. "80", "80,443", "1-1024,8080")
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Maximum number of simultaneous connection attempts
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Only scan 21,22,80,443,3306,8080
    #[arg(long)]
    pub fast: bool,

    /// Report path; .json, .md or .html
    #[arg(long, default_value = "report.json")]
    pub save: PathBuf,

    /// Connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long, default_value = "0")]
    pub rate: u32,

    /// Skip the CVE database lookup
    #[arg(long)]
    pub no_lookup: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let ports = if self.fast {
            PortSpec::fast().to_ports()
        } else {
            parse_ports(self.ports.as_deref().unwrap_or(&settings.default_ports))
        };
        let concurrency = self.concurrency.unwrap_or(settings.default_concurrency);
        let target = Target::new(&self.target, self.timeout_duration(settings));

        if !quiet {
            output::print_scan_header(target.host(), ports.len(), concurrency);
        }

        let scanner = PortScanner::tcp(concurrency)
            .with_rate(self.rate)
            .with_progress(!quiet);
        let open_ports = scanner.scan(&target, &ports).await;

        let banners = BannerGrabber::tcp()
            .with_limiter(ConcurrencyLimiter::new(concurrency))
            .grab(&target, &open_ports)
            .await;

        if !quiet {
            output::print_open_ports(&open_ports, &banners)?;
        }

        let lookup = self.lookup(settings);
        let cves = lookup.check_services(&banners).await;
        let explanations = select_summarizer(settings).explain(&cves).await;

        let report = ScanReport::new(target.host(), open_ports, banners, cves, explanations);
        let copy = report.save(&self.save)?;

        if !quiet {
            output::print_success(&format!("Saved report → {}", self.save.display()));
            if let Some(copy) = copy {
                output::print_info(&format!("Viewer data → {}", copy.display()));
            }
        }
        Ok(())
    }

    fn timeout_duration(&self, settings: &AppSettings) -> Duration {
        let fallback = Duration::from_millis(settings.default_timeout_ms);
        match self.timeout {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|d| !d.is_zero())
                .unwrap_or_else(|| {
                    warn!(secs, "unusable timeout, using the configured default");
                    fallback
                }),
            None => fallback,
        }
    }

    fn lookup(&self, settings: &AppSettings) -> Box<dyn VulnLookup> {
        if self.no_lookup || !settings.vuln_lookup {
            return Box::new(OfflineLookup);
        }
        match CirclLookup::new(settings.vuln_api_base.clone()) {
            Ok(lookup) => Box::new(lookup),
            Err(e) => {
                warn!(error = %e, "CVE lookup unavailable");
                Box::new(OfflineLookup)
            }
        }
    }
}
