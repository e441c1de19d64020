//! Local neighbor (ARP) table snapshots.
//!
//! Three output formats are understood and all normalise to lowercase,
//! colon-separated MAC addresses:
//! - Windows `arp -a`: `  192.168.1.1   aa-bb-cc-dd-ee-ff   dynamic`
//! - Linux `ip neigh`: `192.168.1.1 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE`
//! - BSD-style `arp -an`: `? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0`

use crate::discovery::platform::Platform;
use crate::error::{DiscoveryError, DiscoveryResult};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Longest a neighbor-table command may run before the table counts as empty.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

static WINDOWS_ARP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+\.\d+)\s+([0-9a-fA-F:-]{17})").expect("valid pattern")
});

static BSD_ARP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+\.\d+\.\d+\.\d+)\) at ([0-9a-fA-F:]{17})").expect("valid pattern")
});

/// Address to link-layer address mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborTable {
    entries: HashMap<Ipv4Addr, String>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ip: Ipv4Addr, mac: &str) {
        self.entries.insert(ip, normalize_mac(mac));
    }

    /// Link-layer address for `ip`, if the table has one.
    pub fn get(&self, ip: &Ipv4Addr) -> Option<&str> {
        self.entries.get(ip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse Windows `arp -a` output.
    pub fn parse_windows_arp(output: &str) -> Self {
        Self::from_captures(&WINDOWS_ARP, output)
    }

    /// Parse BSD-style `arp -an` output.
    pub fn parse_bsd_arp(output: &str) -> Self {
        Self::from_captures(&BSD_ARP, output)
    }

    /// Parse Linux `ip neigh` output. Lines without an `lladdr` token
    /// (incomplete or failed entries) are skipped.
    pub fn parse_ip_neigh(output: &str) -> Self {
        let mut table = Self::new();
        for line in output.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                continue;
            }
            let Ok(ip) = parts[0].parse::<Ipv4Addr>() else {
                continue;
            };
            if let Some(idx) = parts.iter().position(|p| *p == "lladdr") {
                if let Some(mac) = parts.get(idx + 1) {
                    table.insert(ip, mac);
                }
            }
        }
        table
    }

    fn from_captures(pattern: &Regex, output: &str) -> Self {
        let mut table = Self::new();
        for caps in output.lines().filter_map(|line| pattern.captures(line)) {
            if let Ok(ip) = caps[1].parse::<Ipv4Addr>() {
                table.insert(ip, &caps[2]);
            }
        }
        table
    }
}

/// `AA-BB-CC-DD-EE-FF` and `AA:BB:...` both become `aa:bb:cc:dd:ee:ff`.
pub fn normalize_mac(mac: &str) -> String {
    mac.replace('-', ":").to_lowercase()
}

/// Source of a neighbor table snapshot.
///
/// Implementations must not fail: an unreadable table is an empty table.
#[async_trait]
pub trait NeighborSource: Send + Sync {
    async fn snapshot(&self) -> NeighborTable;
}

/// Reads the neighbor cache through the platform's tools.
#[derive(Debug, Clone, Copy)]
pub struct SystemNeighbors {
    platform: Platform,
}

impl SystemNeighbors {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn read(&self) -> DiscoveryResult<NeighborTable> {
        match self.platform {
            Platform::Windows => Ok(NeighborTable::parse_windows_arp(
                &run_command("arp", &["-a"], COMMAND_TIMEOUT).await?,
            )),
            Platform::Unix => match run_command("ip", &["neigh"], COMMAND_TIMEOUT).await {
                Ok(output) => Ok(NeighborTable::parse_ip_neigh(&output)),
                Err(e) => {
                    debug!(error = %e, "ip neigh unavailable, trying arp");
                    Ok(NeighborTable::parse_bsd_arp(
                        &run_command("arp", &["-an"], COMMAND_TIMEOUT).await?,
                    ))
                }
            },
        }
    }
}

#[async_trait]
impl NeighborSource for SystemNeighbors {
    async fn snapshot(&self) -> NeighborTable {
        match self.read().await {
            Ok(table) => {
                debug!(entries = table.len(), platform = %self.platform, "neighbor table read");
                table
            }
            Err(e) => {
                warn!(error = %e, "could not read neighbor table, MAC addresses left empty");
                NeighborTable::new()
            }
        }
    }
}

async fn run_command(program: &str, args: &[&str], limit: Duration) -> DiscoveryResult<String> {
    let command = format!("{} {}", program, args.join(" "));
    let running = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = timeout(limit, running)
        .await
        .map_err(|_| DiscoveryError::CommandTimeout(command.clone()))?
        .map_err(|source| DiscoveryError::CommandFailed {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(DiscoveryError::CommandStatus(command));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
