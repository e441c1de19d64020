//! # reconlab - Host Discovery and Connect Scanning
//!
//! reconlab reconnoiters a host or subnet: it finds live hosts, enumerates
//! open TCP ports under bounded concurrency and captures service banners.
//!
//! ## Features
//!
//! - **Connect Scanning**: Full-handshake scans with a configurable bound on
//!   simultaneous attempts and a per-attempt timeout
//! - **Banner Grabbing**: Passive read first, HTTP probe as fallback
//! - **Host Discovery**: Ping sweep over CIDR blocks or octet ranges, with
//!   MAC addresses from the local neighbor table
//! - **Reports**: JSON, Markdown or HTML, with CVE hints per banner
//!
//! Every core operation fails soft: an unreachable target is "no open
//! ports", an unreadable neighbor table is "no MAC addresses".
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use reconlab::{banner, scanner, types::Target};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let target = Target::new("192.168.1.1", Duration::from_secs(1));
//!     let open = scanner::scan(&target, &[22, 80, 443], 100).await;
//!     let banners = banner::grab(&target, &open).await;
//!
//!     for port in open {
//!         println!("{} {}", port, banners[&port]);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`limiter`] - Admission gate shared by the scanner and the sweep
//! - [`scanner`] - Connect scanner over the [`scanner::Connector`] trait
//! - [`banner`] - Banner grabber
//! - [`discovery`] - Liveness sweep and neighbor table parsing
//! - [`vuln`], [`summary`] - Downstream CVE lookup and explanations
//! - [`report`] - Report files
//! - [`config`], [`logging`], [`cli`], [`output`] - Application plumbing

pub mod banner;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod output;
pub mod report;
pub mod scanner;
pub mod summary;
pub mod types;
pub mod vuln;

// Re-export commonly used types
pub use banner::{grab, BannerGrabber, BannerMap};
pub use discovery::{discover, Discovery, HostRecord};
pub use error::{CliError, ScanError};
pub use limiter::ConcurrencyLimiter;
pub use scanner::{scan, PortScanner};
pub use types::{parse_ports, Port, PortSpec, Target};
