//! Expansion of discovery range specifications.

use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use tracing::debug;

/// Inclusive run of consecutive IPv4 addresses.
///
/// Addresses are produced on demand, so a `/8` costs the same to hold as a
/// `/30`. An empty range has `first > last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRange {
    first: u32,
    last: u32,
}

impl HostRange {
    /// Parse a range specification.
    ///
    /// Accepted forms:
    /// - CIDR (`192.168.1.0/24`): every usable host address. Host bits in the
    ///   address part are ignored. /31 and /32 keep all their addresses.
    /// - Single address (`10.0.0.5`).
    /// - Final-octet range (`10.0.0.10-20`), inclusive.
    ///
    /// Anything else is `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if spec.contains('/') {
            parse_cidr(spec)
        } else if let Ok(ip) = spec.parse::<Ipv4Addr>() {
            Some(Self::between(ip, ip))
        } else {
            parse_octet_range(spec)
        }
    }

    fn between(first: Ipv4Addr, last: Ipv4Addr) -> Self {
        Self {
            first: u32::from(first),
            last: u32::from(last),
        }
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            u64::from(self.last - self.first) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// Addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> {
        (self.first..=self.last).map(Ipv4Addr::from)
    }
}

/// Expand a range specification into concrete IPv4 addresses.
///
/// Same forms as [`HostRange::parse`]; anything else expands to nothing.
pub fn expand_range(spec: &str) -> Vec<Ipv4Addr> {
    match HostRange::parse(spec) {
        Some(range) => range.iter().collect(),
        None => {
            debug!(spec, "unparseable range specification");
            Vec::new()
        }
    }
}

fn parse_cidr(spec: &str) -> Option<HostRange> {
    let network: Ipv4Network = spec.parse().ok()?;
    let network = Ipv4Network::new(network.network(), network.prefix()).ok()?;
    let (first, last) = (network.network(), network.broadcast());

    if network.prefix() < 31 {
        Some(HostRange {
            first: u32::from(first) + 1,
            last: u32::from(last) - 1,
        })
    } else {
        Some(HostRange::between(first, last))
    }
}

fn parse_octet_range(spec: &str) -> Option<HostRange> {
    let (base, range) = spec.rsplit_once('.')?;
    let (start, end) = range.split_once('-')?;
    let start: u8 = start.trim().parse().ok()?;
    let end: u8 = end.trim().parse().ok()?;

    let prefix: Vec<u8> = base
        .split('.')
        .map(|octet| octet.parse::<u8>().ok())
        .collect::<Option<_>>()?;
    let [a, b, c] = <[u8; 3]>::try_from(prefix).ok()?;

    Some(HostRange::between(
        Ipv4Addr::new(a, b, c, start),
        Ipv4Addr::new(a, b, c, end),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(list: &[&str]) -> Vec<Ipv4Addr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_cidr_usable_hosts() {
        assert_eq!(
            expand_range("192.168.1.0/30"),
            ips(&["192.168.1.1", "192.168.1.2"])
        );
        assert_eq!(expand_range("10.0.0.0/24").len(), 254);
    }

    #[test]
    fn test_cidr_host_bits_ignored() {
        assert_eq!(
            expand_range("192.168.1.77/30"),
            ips(&["192.168.1.77", "192.168.1.78"])
        );
    }

    #[test]
    fn test_small_prefixes() {
        assert_eq!(expand_range("10.0.0.4/31"), ips(&["10.0.0.4", "10.0.0.5"]));
        assert_eq!(expand_range("10.0.0.4/32"), ips(&["10.0.0.4"]));
    }

    #[test]
    fn test_single_address() {
        assert_eq!(expand_range("10.0.0.5"), ips(&["10.0.0.5"]));
    }

    #[test]
    fn test_octet_range() {
        assert_eq!(
            expand_range("10.1.2.3-5"),
            ips(&["10.1.2.3", "10.1.2.4", "10.1.2.5"])
        );
        assert!(expand_range("10.1.2.5-3").is_empty());
    }

    #[test]
    fn test_whole_address_space_is_lazy() {
        let range = HostRange::parse("0.0.0.0/0").unwrap();
        assert_eq!(range.len(), (1u64 << 32) - 2);
        let head: Vec<Ipv4Addr> = range.iter().take(2).collect();
        assert_eq!(head, ips(&["0.0.0.1", "0.0.0.2"]));
    }

    #[test]
    fn test_range_len() {
        assert_eq!(HostRange::parse("10.0.0.0/8").unwrap().len(), 16_777_214);
        assert_eq!(HostRange::parse("10.1.2.3-5").unwrap().len(), 3);
        assert!(HostRange::parse("10.1.2.5-3").unwrap().is_empty());
        assert_eq!(HostRange::parse("nope"), None);
    }

    #[test]
    fn test_garbage_is_empty() {
        for bad in ["", "nope", "10.0.0.0/33", "10.0.0.1-300", "10.0.1-5", "::1", "a.b.c.1-2"] {
            assert!(expand_range(bad).is_empty(), "input {bad:?}");
        }
    }
}
