//! Scan target normalisation and resolution.
//!
//! A `Target` is the host identifier handed to the scanner and the banner
//! grabber together with the per-attempt timeout. Validation is resolution:
//! IP literals are used as-is, hostnames go through the async resolver, and a
//! failure is reported to the caller as an error it can turn into "no open
//! ports".

use crate::error::{ScanError, ScanResult};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A host to scan plus the default timeout for each network attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    timeout: Duration,
}

impl Target {
    /// Create a target from raw user input. URLs and path suffixes are
    /// reduced to the bare host.
    pub fn new(raw: &str, timeout: Duration) -> Self {
        Self {
            host: normalize_target(raw),
            timeout,
        }
    }

    /// The normalised host identifier.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Timeout applied to every individual connect/read.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the host to a connectable address.
    pub async fn resolve(&self) -> ScanResult<IpAddr> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(ip);
        }
        if self.host.is_empty() {
            return Err(ScanError::NoAddresses(self.host.clone()));
        }

        let response = system_resolver()
            .lookup_ip(self.host.as_str())
            .await
            .map_err(|e| ScanError::DnsResolution(self.host.clone(), e.to_string()))?;

        response
            .iter()
            .next()
            .ok_or_else(|| ScanError::NoAddresses(self.host.clone()))
    }
}

/// Resolver following the host's own configuration, or public upstreams
/// when that cannot be read.
fn system_resolver() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        debug!(error = %e, "system resolver configuration unavailable, using defaults");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    })
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)
    }
}

/// Reduce user input to a hostname or address.
///
/// `http://` and `https://` URLs yield their host (without port or path);
/// anything else loses everything from the first `/`.
pub fn normalize_target(raw: &str) -> String {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();

    for scheme in ["http://", "https://"] {
        if lower.starts_with(scheme) {
            let rest = &raw[scheme.len()..];
            let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
            let authority = authority.rsplit('@').next().unwrap_or_default();
            return strip_url_port(authority).to_string();
        }
    }

    raw.split('/').next().unwrap_or_default().to_string()
}

fn strip_url_port(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_normalize_plain() {
        assert_eq!(normalize_target("  10.0.0.1 "), "10.0.0.1");
        assert_eq!(normalize_target("example.com"), "example.com");
        assert_eq!(normalize_target("192.168.1.0/24"), "192.168.1.0");
    }

    #[test]
    fn test_normalize_urls() {
        assert_eq!(normalize_target("http://example.com/index.html"), "example.com");
        assert_eq!(normalize_target("https://user@example.com:8443/a?b"), "example.com");
        assert_eq!(normalize_target("HTTP://Example.com"), "Example.com");
        assert_eq!(normalize_target("http://[::1]:8080/"), "::1");
    }

    #[tokio::test]
    async fn test_resolve_literal() {
        let target = Target::new("127.0.0.1", Duration::from_secs(1));
        assert_eq!(
            target.resolve().await.unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[tokio::test]
    async fn test_resolve_hosts_file_name() {
        let target = Target::new("localhost", Duration::from_secs(2));
        assert!(target.resolve().await.unwrap().is_loopback());
    }

    #[tokio::test]
    async fn test_resolve_empty_fails() {
        let target = Target::new("", Duration::from_secs(1));
        assert!(matches!(
            target.resolve().await,
            Err(ScanError::NoAddresses(_))
        ));
    }
}
