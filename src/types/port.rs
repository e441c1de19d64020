//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` and `PortSpec` handle range/list specifications such as
//! `"1-1024,8080"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Ports used when a specification cannot be parsed, and by `--fast`.
pub const DEFAULT_PORTS: [u16; 6] = [21, 22, 80, 443, 3306, 8080];

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value as u32))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// A range of ports (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Create a new port range.
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start.0 > end.0 {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Iterate over all ports in this range.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A complete port specification that can contain multiple ranges.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1024"
/// - Mixed: "22,80,443,8000-9000"
#[derive(Debug, Clone, Default)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a port range to the specification.
    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    /// Add a single port to the specification.
    pub fn add_port(&mut self, port: Port) {
        self.ranges.push(PortRange::single(port));
    }

    /// Get all ports as a sorted, deduplicated vector.
    pub fn to_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self
            .ranges
            .iter()
            .flat_map(|r| r.iter())
            .map(Port::as_u16)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The fixed set used by `--fast` and as the parse fallback.
    pub fn fast() -> Self {
        let mut spec = Self::new();
        for &p in &DEFAULT_PORTS {
            if let Some(port) = Port::new(p) {
                spec.add_port(port);
            }
        }
        spec
    }
}

fn parse_bound(text: &str) -> Result<Port, PortError> {
    let text = text.trim();
    let value: u32 = text
        .parse()
        .map_err(|_| PortError::InvalidFormat(text.to_string()))?;
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortError::OutOfRange(value))
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = Self::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let range = PortRange::new(parse_bound(start)?, parse_bound(end)?)?;
                    spec.add_range(range);
                }
                None => spec.add_port(parse_bound(part)?),
            }
        }

        if spec.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(spec)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Expand a port specification, falling back to [`DEFAULT_PORTS`] when it
/// cannot be parsed.
pub fn parse_ports(spec: &str) -> Vec<u16> {
    match spec.parse::<PortSpec>() {
        Ok(spec) => spec.to_ports(),
        Err(e) => {
            warn!(spec, error = %e, "unusable port specification, using default ports");
            DEFAULT_PORTS.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
        assert_eq!(Port::try_from(0), Err(PortError::OutOfRange(0)));
    }

    #[test]
    fn test_parse_mixed() {
        assert_eq!(parse_ports("20-22,80"), vec![20, 21, 22, 80]);
        assert_eq!(parse_ports("22,80,100-102"), vec![22, 80, 100, 101, 102]);
    }

    #[test]
    fn test_parse_dedup_and_sort() {
        assert_eq!(parse_ports("443,80,80,79-81"), vec![79, 80, 81, 443]);
    }

    #[test]
    fn test_parse_whitespace_and_trailing_comma() {
        assert_eq!(parse_ports(" 22 , 25- 26,"), vec![22, 25, 26]);
    }

    #[test]
    fn test_malformed_falls_back() {
        for bad in ["abc", "80,x", "100-50", "0", "70000", "1-2-3", "", " , "] {
            assert_eq!(parse_ports(bad), DEFAULT_PORTS.to_vec(), "input {bad:?}");
        }
    }

    #[test]
    fn test_spec_errors() {
        assert_eq!("100-50".parse::<PortSpec>().unwrap_err(), PortError::InvalidRange(100, 50));
        assert_eq!("".parse::<PortSpec>().unwrap_err(), PortError::Empty);
        assert!(matches!(
            "http".parse::<PortSpec>(),
            Err(PortError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_fast_spec() {
        assert_eq!(PortSpec::fast().to_ports(), DEFAULT_PORTS.to_vec());
    }

    #[test]
    fn test_display_round() {
        let spec: PortSpec = "22,8000-8010".parse().unwrap();
        assert_eq!(spec.to_string(), "22,8000-8010");
    }
}
