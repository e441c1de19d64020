//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory
//! (`~/.config/reconlab` on Linux) unless a path is given explicitly.

use crate::error::{ConfigError, ConfigResult};
use crate::limiter::{DEFAULT_DISCOVERY_WORKERS, DEFAULT_SCAN_CONCURRENCY};
use crate::vuln::DEFAULT_API_BASE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/reconlab)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user directories. Nothing is created.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "reconlab", "reconlab").ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Simultaneous connects during a port scan.
    pub default_concurrency: usize,
    /// Per-attempt timeout for scanning and banner grabbing, milliseconds.
    pub default_timeout_ms: u64,
    /// Port specification used when `--ports` is not given.
    pub default_ports: String,
    /// Simultaneous liveness probes during discovery.
    pub discovery_workers: usize,
    /// Per-probe timeout for discovery, milliseconds.
    pub discovery_timeout_ms: u64,
    /// Whether banners are looked up in the CVE database.
    pub vuln_lookup: bool,
    /// CVE search endpoint; the service keyword is appended.
    pub vuln_api_base: String,
    /// Chat model used when remote summaries are enabled.
    pub summary_model: String,
    /// Log filter used when neither `RUST_LOG` nor a verbosity flag is set.
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: DEFAULT_SCAN_CONCURRENCY,
            default_timeout_ms: 1000,
            default_ports: "1-1024".to_string(),
            discovery_workers: DEFAULT_DISCOVERY_WORKERS,
            discovery_timeout_ms: 500,
            vuln_lookup: true,
            vuln_api_base: DEFAULT_API_BASE.to_string(),
            summary_model: "gpt-3.5-turbo".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let file = Paths::discover()?.settings_file();
                if file.exists() {
                    Self::load_from(&file)
                } else {
                    debug!(path = %file.display(), "no settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}
