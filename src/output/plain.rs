//! Plain text console output.
//!
//! Produces human-readable output with colors and formatting.

use crate::banner::BannerMap;
use crate::discovery::HostRecord;
use crate::output::services::well_known_service;
use console::style;
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print a header before scanning begins.
pub fn print_scan_header(target: &str, ports: usize, concurrency: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("reconlab").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Target: {}", style("•").dim(), style(target).white().bold());
    println!(
        "{} Scanning {} ports, {} at a time...",
        style("•").dim(),
        style(ports).white().bold(),
        concurrency
    );
    println!();
}

/// Print a header before a discovery sweep.
pub fn print_discovery_header(network: &str, addresses: u64) {
    println!();
    println!(
        "{} {} {} ({} addresses)",
        style("Discovering").cyan(),
        style(network).white().bold(),
        style("•").dim(),
        addresses
    );
    println!();
}

/// Print the open ports with service names and banners.
pub fn print_open_ports(open_ports: &[u16], banners: &BannerMap) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "  {} {}",
        style("Open ports:").bold(),
        style(open_ports.len()).green().bold()
    )?;
    if open_ports.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
        return Ok(());
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(
        out,
        "  {:>6}  {:<15}  {}",
        style("PORT").bold(),
        style("SERVICE").bold(),
        style("BANNER").bold()
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;

    for port in open_ports {
        let banner = banners.get(port).map(String::as_str).unwrap_or_default();
        writeln!(
            out,
            "  {:>6}  {:<15}  {}",
            style(port).green().bold(),
            well_known_service(*port).unwrap_or("unknown"),
            style(truncate_string(banner, 40)).dim()
        )?;
    }
    writeln!(out, "  {}", style(RULE).dim())?;
    Ok(())
}

/// Print the live hosts found by a sweep.
pub fn print_hosts(hosts: &[HostRecord]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "  {} {}",
        style("Active devices:").bold(),
        style(hosts.len()).green().bold()
    )?;
    for host in hosts {
        let mac = if host.mac.is_empty() {
            style("-".to_string()).dim()
        } else {
            style(host.mac.clone())
        };
        writeln!(out, "  {:<16} {}", host.ip, mac)?;
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate to `max_len` characters, adding an ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
