//! Best-effort banner grabbing.
//!
//! Each port gets its own connection. The grabber first waits for the
//! service to speak (SSH, FTP and SMTP greet unprompted); if nothing arrives
//! it sends a minimal HTTP/1.0 request and keeps the first response line.
//! Any failure yields an empty banner, never an error.

use crate::error::ScanError;
use crate::limiter::ConcurrencyLimiter;
use crate::scanner::{Connector, TcpConnector};
use crate::types::Target;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Maximum bytes read for a banner.
const MAX_BANNER_SIZE: usize = 4096;

/// Open port to best-effort banner text.
pub type BannerMap = BTreeMap<u16, String>;

/// Grabs banners over any [`Connector`].
pub struct BannerGrabber<C: Connector> {
    connector: Arc<C>,
    limiter: Option<ConcurrencyLimiter>,
}

impl BannerGrabber<TcpConnector> {
    /// Grabber using real TCP sockets.
    pub fn tcp() -> Self {
        Self::new(TcpConnector::new())
    }
}

impl<C: Connector> BannerGrabber<C> {
    /// Create a grabber with no bound on simultaneous connections.
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            limiter: None,
        }
    }

    /// Bound simultaneous banner connections.
    pub fn with_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Grab a banner from every port in `ports`.
    ///
    /// Every attempted port is present in the result; ports that yielded
    /// nothing map to an empty string.
    pub async fn grab(&self, target: &Target, ports: &[u16]) -> BannerMap {
        let ip = match target.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(target = %target, error = %e, "target did not resolve, banners left empty");
                return ports.iter().map(|&p| (p, String::new())).collect();
            }
        };

        let attempts = ports
            .iter()
            .map(|&port| async move { (port, self.grab_port(ip, target, port).await) });

        join_all(attempts).await.into_iter().collect()
    }

    async fn grab_port(&self, ip: IpAddr, target: &Target, port: u16) -> String {
        let _permit = match &self.limiter {
            Some(limiter) => match limiter.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => return String::new(),
            },
            None => None,
        };

        let addr = SocketAddr::new(ip, port);
        let attempt = timeout(target.timeout(), self.connector.connect(addr, target.timeout()))
            .await
            .unwrap_or(Err(ScanError::Timeout));
        let mut stream = match attempt {
            Ok(stream) => stream,
            Err(e) => {
                debug!(%addr, error = %e, "banner connection failed");
                return String::new();
            }
        };

        let banner = read_banner(&mut stream, target.host(), target.timeout()).await;
        if let Err(e) = stream.shutdown().await {
            trace!(%addr, error = %e, "ignoring error while closing banner connection");
        }
        debug!(%addr, banner = %banner, "banner grabbed");
        banner
    }
}

/// Passive read, then the HTTP fallback.
pub async fn read_banner<S>(stream: &mut S, host: &str, limit: Duration) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];

    if let Some(n) = read_some(stream, &mut buffer, limit).await {
        let text = String::from_utf8_lossy(&buffer[..n]);
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    let probe = http_probe(host);
    match timeout(limit, stream.write_all(probe.as_bytes())).await {
        Ok(Ok(())) => {}
        _ => return String::new(),
    }

    match read_some(stream, &mut buffer, limit).await {
        Some(n) => first_line(&String::from_utf8_lossy(&buffer[..n])),
        None => String::new(),
    }
}

async fn read_some<S>(stream: &mut S, buffer: &mut [u8], limit: Duration) -> Option<usize>
where
    S: AsyncRead + Unpin,
{
    match timeout(limit, stream.read(buffer)).await {
        Ok(Ok(n)) if n > 0 => Some(n),
        _ => None,
    }
}

/// Minimal request used to make HTTP-family services answer.
fn http_probe(host: &str) -> String {
    format!("GET / HTTP/1.0\r\nHost: {}\r\n\r\n", host)
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

/// Grab banners with real sockets.
pub async fn grab(target: &Target, ports: &[u16]) -> BannerMap {
    BannerGrabber::tcp().grab(target, ports).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{duplex, DuplexStream};

    /// Hands out connections to a service that greets immediately.
    #[derive(Default)]
    struct GreetingConnector {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Connector for GreetingConnector {
        type Stream = DuplexStream;

        async fn connect(&self, _addr: SocketAddr, _timeout: Duration) -> ScanResult<DuplexStream> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            let (client, mut server) = duplex(64);
            server
                .write_all(b"220 ready\r\n")
                .await
                .map_err(|_| ScanError::ConnectionRefused)?;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                drop(server);
            });
            Ok(client)
        }
    }

    #[tokio::test]
    async fn test_limiter_bounds_connections() {
        let grabber =
            BannerGrabber::new(GreetingConnector::default()).with_limiter(ConcurrencyLimiter::new(2));
        let target = Target::new("127.0.0.1", Duration::from_millis(200));
        let ports: Vec<u16> = (1000..1012).collect();

        let banners = grabber.grab(&target, &ports).await;

        assert_eq!(banners.len(), 12);
        assert!(banners.values().all(|b| b == "220 ready"));
        let peak = grabber.connector.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak {} exceeded bound", peak);
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("HTTP/1.0 200 OK\r\nServer: x\r\n"), "HTTP/1.0 200 OK");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_http_probe_has_host() {
        assert_eq!(
            http_probe("example.com"),
            "GET / HTTP/1.0\r\nHost: example.com\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_passive_banner_is_trimmed() {
        let (mut client, mut server) = duplex(1024);
        server.write_all(b"SSH-2.0-OpenSSH_8.9\r\n").await.unwrap();
        let banner = read_banner(&mut client, "host", Duration::from_millis(200)).await;
        assert_eq!(banner, "SSH-2.0-OpenSSH_8.9");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let (mut client, mut server) = duplex(1024);
        server.write_all(b"220 caf\xff ready\n").await.unwrap();
        let banner = read_banner(&mut client, "host", Duration::from_millis(200)).await;
        assert_eq!(banner, "220 caf\u{fffd} ready");
    }

    #[tokio::test]
    async fn test_fallback_probe_first_line() {
        let (mut client, mut server) = duplex(1024);
        let responder = tokio::spawn(async move {
            let mut request = vec![0u8; 256];
            let n = server.read(&mut request).await.unwrap();
            assert!(request[..n].starts_with(b"GET / HTTP/1.0\r\nHost: stub\r\n"));
            server
                .write_all(b"HTTP/1.0 200 OK\r\nServer: stub\r\n\r\nhello")
                .await
                .unwrap();
            server
        });

        let banner = read_banner(&mut client, "stub", Duration::from_millis(100)).await;
        assert_eq!(banner, "HTTP/1.0 200 OK");
        drop(responder.await.unwrap());
    }

    #[tokio::test]
    async fn test_silent_service_is_empty() {
        let (mut client, _server) = duplex(1024);
        let banner = read_banner(&mut client, "host", Duration::from_millis(50)).await;
        assert_eq!(banner, "");
    }
}
