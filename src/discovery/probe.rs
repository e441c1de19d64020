//! Liveness probing through the system `ping` utility.

use crate::discovery::platform::Platform;
use crate::error::{DiscoveryError, DiscoveryResult};
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Extra time allowed for the child process beyond the echo timeout.
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Answers "is this address responding right now".
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe `addr`, waiting at most `timeout_ms` for an echo reply.
    async fn probe(&self, addr: Ipv4Addr, timeout_ms: u64) -> bool;
}

/// ICMP echo through the platform `ping` command.
#[derive(Debug, Clone, Copy)]
pub struct PingProber {
    platform: Platform,
}

impl PingProber {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Arguments for a single echo request. Windows takes milliseconds, the
    /// Unix tools take whole seconds (at least one).
    pub fn args(&self, addr: Ipv4Addr, timeout_ms: u64) -> Vec<String> {
        match self.platform {
            Platform::Windows => vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout_ms.to_string(),
                addr.to_string(),
            ],
            Platform::Unix => vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                timeout_secs(timeout_ms).to_string(),
                addr.to_string(),
            ],
        }
    }

    async fn run(&self, addr: Ipv4Addr, timeout_ms: u64) -> DiscoveryResult<bool> {
        let mut child = Command::new("ping")
            .args(self.args(addr, timeout_ms))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DiscoveryError::CommandFailed {
                command: "ping".to_string(),
                source,
            })?;

        let limit = Duration::from_millis(timeout_ms).saturating_add(PROCESS_GRACE);
        match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(source)) => Err(DiscoveryError::CommandFailed {
                command: "ping".to_string(),
                source,
            }),
            Err(_) => {
                trace!(%addr, "ping did not exit in time");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, addr: Ipv4Addr, timeout_ms: u64) -> bool {
        match self.run(addr, timeout_ms).await {
            Ok(alive) => alive,
            Err(e) => {
                debug!(%addr, error = %e, "liveness probe failed");
                false
            }
        }
    }
}

/// Milliseconds to whole seconds, rounded, never below one.
fn timeout_secs(timeout_ms: u64) -> u64 {
    (timeout_ms.saturating_add(500) / 1000).max(1)
}
