//! Discovery result file.

use super::write_file;
use crate::discovery::HostRecord;
use crate::error::ReportResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The live hosts found in one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub network: String,
    pub devices: Vec<HostRecord>,
}

impl DiscoveryReport {
    pub fn new(network: impl Into<String>, devices: Vec<HostRecord>) -> Self {
        Self {
            network: network.into(),
            devices,
        }
    }

    /// Write pretty-printed JSON to `path`.
    pub fn save(&self, path: &Path) -> ReportResult<()> {
        write_file(path, &serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.json");
        let report = DiscoveryReport::new(
            "192.168.1.0/24",
            vec![HostRecord {
                ip: "192.168.1.1".parse().unwrap(),
                mac: "aa:bb:cc:dd:ee:ff".to_string(),
            }],
        );
        report.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["network"], "192.168.1.0/24");
        assert_eq!(value["devices"][0]["ip"], "192.168.1.1");
        assert_eq!(value["devices"][0]["mac"], "aa:bb:cc:dd:ee:ff");
    }
}
