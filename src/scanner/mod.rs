//! Bounded-concurrency TCP connect scanner.
//!
//! Every port becomes its own unit of work. All of them are issued at once
//! and a [`ConcurrencyLimiter`] decides how many may be connecting at any
//! moment; completion order is whatever the network produces, and the
//! result is sorted only at the end.

pub mod rate_limiter;
pub mod tcp;
pub mod traits;

use crate::error::ScanError;
use crate::limiter::ConcurrencyLimiter;
use crate::output::progress_bar;
use crate::types::Target;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, trace, warn};

pub use rate_limiter::RateLimiter;
pub use tcp::TcpConnector;
pub use traits::{Connector, PortStatus};

/// Connect scanner over any [`Connector`].
pub struct PortScanner<C: Connector> {
    connector: Arc<C>,
    limiter: ConcurrencyLimiter,
    rate: Option<RateLimiter>,
    show_progress: bool,
}

impl PortScanner<TcpConnector> {
    /// Scanner using real TCP sockets.
    pub fn tcp(concurrency: usize) -> Self {
        Self::new(TcpConnector::new(), concurrency)
    }
}

impl<C: Connector> PortScanner<C> {
    /// Create a scanner admitting at most `concurrency` connects at once.
    pub fn new(connector: C, concurrency: usize) -> Self {
        Self {
            connector: Arc::new(connector),
            limiter: ConcurrencyLimiter::new(concurrency),
            rate: None,
            show_progress: false,
        }
    }

    /// Additionally pace attempts to `rate` per second (0 = unlimited).
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = RateLimiter::new(rate);
        self
    }

    /// Render a progress bar on stderr while scanning.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Scan `ports` on `target` and return the open ones, sorted ascending.
    ///
    /// Resolution failure yields an empty list.
    pub async fn scan(&self, target: &Target, ports: &[u16]) -> Vec<u16> {
        match target.resolve().await {
            Ok(ip) => self.scan_addr(ip, ports, target.timeout()).await,
            Err(e) => {
                warn!(target = %target, error = %e, "target did not resolve, reporting no open ports");
                Vec::new()
            }
        }
    }

    /// Scan an already resolved address.
    pub async fn scan_addr(&self, ip: IpAddr, ports: &[u16], timeout: Duration) -> Vec<u16> {
        let start = Instant::now();
        let total = ports.len();
        let progress = progress_bar(total as u64, &format!("Scanning {}", ip), self.show_progress);

        debug!(%ip, total, concurrency = self.limiter.limit(), "starting connect scan");

        let states: HashMap<u16, bool> = stream::iter(ports.iter().copied())
            .map(|port| {
                let connector = Arc::clone(&self.connector);
                let limiter = self.limiter.clone();
                let rate = self.rate.clone();
                let progress = progress.clone();

                async move {
                    let status = match limiter.acquire().await {
                        Ok(_permit) => {
                            if let Some(rate) = rate {
                                rate.wait().await;
                            }
                            probe_port(connector.as_ref(), SocketAddr::new(ip, port), timeout).await
                        }
                        Err(e) => {
                            debug!(port, error = %e, "limiter closed, treating port as closed");
                            PortStatus::Closed
                        }
                    };

                    progress.inc(1);
                    if status.is_open() {
                        progress.set_message(format!("open: {}", port));
                    }
                    (port, status.is_open())
                }
            })
            .buffer_unordered(total.max(1))
            .collect()
            .await;

        progress.finish_and_clear();

        let mut open: Vec<u16> = states
            .into_iter()
            .filter_map(|(port, open)| open.then_some(port))
            .collect();
        open.sort_unstable();

        info!(
            %ip,
            scanned = total,
            open = open.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "connect scan finished"
        );
        open
    }
}

/// One connect attempt, bounded by `timeout` whatever the connector does.
/// A successful stream is shut down straight away.
async fn probe_port<C: Connector>(connector: &C, addr: SocketAddr, timeout: Duration) -> PortStatus {
    let attempt = tokio::time::timeout(timeout, connector.connect(addr, timeout))
        .await
        .unwrap_or(Err(ScanError::Timeout));

    match attempt {
        Ok(mut stream) => {
            if let Err(e) = stream.shutdown().await {
                trace!(%addr, error = %e, "ignoring error while closing probe connection");
            }
            trace!(%addr, "open");
            PortStatus::Open
        }
        Err(e) => {
            let status = tcp::status_for_error(&e);
            trace!(%addr, %status, error = %e, "attempt failed");
            status
        }
    }
}

/// Scan `ports` on `target` with real sockets.
pub async fn scan(target: &Target, ports: &[u16], concurrency: usize) -> Vec<u16> {
    PortScanner::tcp(concurrency).scan(target, ports).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanResult;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::DuplexStream;

    /// Opens a fixed set of ports, holding each attempt for a short while
    /// and recording the peak number of simultaneous attempts.
    struct CountingConnector {
        open: HashSet<u16>,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingConnector {
        fn new(open: &[u16]) -> Self {
            Self {
                open: open.iter().copied().collect(),
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Stream = DuplexStream;

        async fn connect(&self, addr: SocketAddr, _timeout: Duration) -> ScanResult<DuplexStream> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if self.open.contains(&addr.port()) {
                Ok(tokio::io::duplex(64).0)
            } else {
                Err(ScanError::ConnectionRefused)
            }
        }
    }

    /// Never completes a handshake on its own.
    struct HangingConnector;

    #[async_trait]
    impl Connector for HangingConnector {
        type Stream = DuplexStream;

        async fn connect(&self, _addr: SocketAddr, _timeout: Duration) -> ScanResult<DuplexStream> {
            std::future::pending().await
        }
    }

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_ports_sorted() {
        let scanner = PortScanner::new(CountingConnector::new(&[443, 22, 80]), 16);
        let ports: Vec<u16> = (1..=500).rev().collect();
        let open = scanner
            .scan_addr(localhost(), &ports, Duration::from_millis(50))
            .await;
        assert_eq!(open, vec![22, 80, 443]);
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let scanner = PortScanner::new(CountingConnector::new(&[]), 7);
        let ports: Vec<u16> = (1..=200).collect();
        let open = scanner
            .scan_addr(localhost(), &ports, Duration::from_millis(50))
            .await;
        assert!(open.is_empty());
        let peak = scanner.connector.peak.load(Ordering::SeqCst);
        assert!(peak <= 7, "peak {} exceeded bound", peak);
        assert!(peak > 1, "attempts were never concurrent");
    }

    #[tokio::test]
    async fn test_hanging_attempts_bounded_by_timeout() {
        let scanner = PortScanner::new(HangingConnector, 10);
        let ports: Vec<u16> = (1..=50).collect();

        let start = Instant::now();
        let open = scanner
            .scan_addr(localhost(), &ports, Duration::from_millis(50))
            .await;
        let elapsed = start.elapsed();

        assert!(open.is_empty());
        // Five rounds of 50 ms; serially this would take 2.5 s.
        assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_empty_port_list() {
        let scanner = PortScanner::new(CountingConnector::new(&[80]), 4);
        assert!(scanner
            .scan_addr(localhost(), &[], Duration::from_millis(50))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_empty() {
        let scanner = PortScanner::new(CountingConnector::new(&[80]), 4);
        let target = Target::new("", Duration::from_millis(50));
        assert!(scanner.scan(&target, &[80]).await.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_scan_completes() {
        let scanner = PortScanner::new(CountingConnector::new(&[3]), 4).with_rate(1000);
        let open = scanner
            .scan_addr(localhost(), &[1, 2, 3, 4], Duration::from_millis(50))
            .await;
        assert_eq!(open, vec![3]);
    }
}
