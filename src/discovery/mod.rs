//! Subnet host discovery.
//!
//! A sweep walks the range specification lazily, probes every address under
//! a [`ConcurrencyLimiter`], sorts the responders numerically and then
//! attaches MAC addresses from a single neighbor table snapshot. Only
//! `workers` probes exist at any moment, whatever the size of the range.
//!
//! Per address the only states are pending, live and unreachable. There
//! are no retries within a sweep.

pub mod neighbor;
pub mod platform;
pub mod probe;
pub mod range;

use crate::limiter::ConcurrencyLimiter;
use crate::output::progress_bar;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub use neighbor::{NeighborSource, NeighborTable, SystemNeighbors};
pub use platform::Platform;
pub use probe::{PingProber, Prober};
pub use range::{expand_range, HostRange};

/// A host that answered a liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub ip: Ipv4Addr,
    /// Link-layer address, empty when the neighbor table had none.
    pub mac: String,
}

/// Liveness sweep over any [`Prober`] and [`NeighborSource`].
pub struct Discovery<P: Prober, N: NeighborSource> {
    prober: Arc<P>,
    neighbors: N,
    limiter: ConcurrencyLimiter,
    timeout_ms: u64,
    show_progress: bool,
}

impl Discovery<PingProber, SystemNeighbors> {
    /// Sweep using the system `ping` and neighbor tools for `platform`.
    pub fn system(platform: Platform, workers: usize, timeout_ms: u64) -> Self {
        Self::new(
            PingProber::new(platform),
            SystemNeighbors::new(platform),
            workers,
            timeout_ms,
        )
    }
}

impl<P: Prober, N: NeighborSource> Discovery<P, N> {
    pub fn new(prober: P, neighbors: N, workers: usize, timeout_ms: u64) -> Self {
        Self {
            prober: Arc::new(prober),
            neighbors,
            limiter: ConcurrencyLimiter::new(workers),
            timeout_ms,
            show_progress: false,
        }
    }

    /// Render a progress bar on stderr while sweeping.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Discover live hosts in `range_spec`. Unparseable input yields an
    /// empty list.
    pub async fn discover(&self, range_spec: &str) -> Vec<HostRecord> {
        let range = match HostRange::parse(range_spec) {
            Some(range) if !range.is_empty() => range,
            _ => {
                info!(range = range_spec, "no addresses to probe");
                return Vec::new();
            }
        };

        let live = self.sweep_iter(range.iter(), range.len()).await;
        let table = self.neighbors.snapshot().await;

        live.into_iter()
            .map(|ip| HostRecord {
                ip,
                mac: table.get(&ip).unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Probe every address and return the responders in numeric order.
    pub async fn sweep(&self, candidates: &[Ipv4Addr]) -> Vec<Ipv4Addr> {
        self.sweep_iter(candidates.iter().copied(), candidates.len() as u64)
            .await
    }

    async fn sweep_iter<I>(&self, candidates: I, total: u64) -> Vec<Ipv4Addr>
    where
        I: Iterator<Item = Ipv4Addr>,
    {
        let start = Instant::now();
        let progress = progress_bar(total, "Sweeping", self.show_progress);
        let timeout_ms = self.timeout_ms;

        let mut live: Vec<Ipv4Addr> = stream::iter(candidates)
            .map(|ip| {
                let prober = Arc::clone(&self.prober);
                let limiter = self.limiter.clone();
                let progress = progress.clone();

                async move {
                    let alive = match limiter.acquire().await {
                        Ok(_permit) => prober.probe(ip, timeout_ms).await,
                        Err(_) => false,
                    };
                    progress.inc(1);
                    debug!(%ip, alive, "probed");
                    alive.then_some(ip)
                }
            })
            .buffer_unordered(self.limiter.limit())
            .filter_map(|ip| async move { ip })
            .collect()
            .await;

        progress.finish_and_clear();
        live.sort_unstable();

        info!(
            probed = total,
            live = live.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "liveness sweep finished"
        );
        live
    }
}

/// Discover hosts with the system tools for the current platform.
pub async fn discover(range_spec: &str, workers: usize, timeout_ms: u64) -> Vec<HostRecord> {
    Discovery::system(Platform::current(), workers, timeout_ms)
        .discover(range_spec)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeProber {
        live: HashSet<Ipv4Addr>,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeProber {
        fn new(live: &[&str]) -> Self {
            Self {
                live: live.iter().map(|s| s.parse().unwrap()).collect(),
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, addr: Ipv4Addr, _timeout_ms: u64) -> bool {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // Later addresses answer sooner so completion order is scrambled.
            let delay = 20 - u64::from(addr.octets()[3] % 20);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.live.contains(&addr)
        }
    }

    struct FixedNeighbors(NeighborTable);

    #[async_trait]
    impl NeighborSource for FixedNeighbors {
        async fn snapshot(&self) -> NeighborTable {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_sorted_numerically_with_macs() {
        let mut table = NeighborTable::new();
        table.insert("10.0.0.9".parse().unwrap(), "AA-BB-CC-DD-EE-09");

        let discovery = Discovery::new(
            FakeProber::new(&["10.0.0.100", "10.0.0.9", "10.0.0.20"]),
            FixedNeighbors(table),
            8,
            100,
        );
        let hosts = discovery.discover("10.0.0.0/24").await;

        let ips: Vec<String> = hosts.iter().map(|h| h.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.20", "10.0.0.100"]);
        assert_eq!(hosts[0].mac, "aa:bb:cc:dd:ee:09");
        assert_eq!(hosts[1].mac, "");
    }

    #[tokio::test]
    async fn test_worker_bound_respected() {
        let discovery = Discovery::new(
            FakeProber::new(&[]),
            FixedNeighbors(NeighborTable::new()),
            5,
            100,
        );
        assert!(discovery.discover("10.0.0.1-60").await.is_empty());
        assert!(discovery.prober.peak.load(Ordering::SeqCst) <= 5);
    }

    /// Answers at once and tracks how many probes exist simultaneously.
    #[derive(Default)]
    struct SilentProber {
        calls: AtomicUsize,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Prober for SilentProber {
        async fn probe(&self, _addr: Ipv4Addr, _timeout_ms: u64) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            false
        }
    }

    #[tokio::test]
    async fn test_large_prefix_probed_lazily() {
        let discovery = Discovery::new(
            SilentProber::default(),
            FixedNeighbors(NeighborTable::new()),
            4,
            10,
        );
        assert!(discovery.discover("10.20.0.0/16").await.is_empty());
        assert_eq!(discovery.prober.calls.load(Ordering::SeqCst), 65_534);
        assert!(discovery.prober.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_unparseable_range_is_empty() {
        let discovery = Discovery::new(
            FakeProber::new(&["10.0.0.1"]),
            FixedNeighbors(NeighborTable::new()),
            5,
            100,
        );
        assert!(discovery.discover("not-a-network").await.is_empty());
    }

    #[test]
    fn test_host_record_json() {
        let record = HostRecord {
            ip: "192.168.1.5".parse().unwrap(),
            mac: String::new(),
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"ip":"192.168.1.5","mac":""}"#
        );
    }
}
