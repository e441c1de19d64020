//! Error types for reconlab.
//!
//! Uses `thiserror` for ergonomic error definitions. The scanning core
//! never surfaces these to its callers: they are produced by internal
//! helpers and converted to empty results at the component boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while connecting to or resolving a scan target.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Connection failed to {target}:{port}: {reason}")]
    ConnectionFailed {
        target: String,
        port: u16,
        reason: String,
    },

    #[error("Connection timed out")]
    Timeout,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Host unreachable")]
    HostUnreachable,

    #[error("DNS resolution failed for '{0}': {1}")]
    DnsResolution(String, String),

    #[error("No addresses found for '{0}'")]
    NoAddresses(String),
}

/// Errors raised by the platform probe and neighbor-table capabilities.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to run '{command}': {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' exited with a failure status")]
    CommandStatus(String),

    #[error("'{0}' did not finish in time")]
    CommandTimeout(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

/// Report writing errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from remote collaborators (vulnerability database, summarizer).
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Top-level error for the command line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for discovery capabilities.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Result type alias for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for report writing.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type alias for collaborator lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type alias for CLI handlers.
pub type CliResult<T> = Result<T, CliError>;
