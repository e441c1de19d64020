//! Console output.
//!
//! Results and status messages go to stdout/stderr with `console` styling;
//! long sweeps draw an `indicatif` progress bar on stderr.

mod plain;
mod progress;
mod services;

pub use plain::{
    print_discovery_header, print_hosts, print_info, print_open_ports, print_scan_header,
    print_success,
};
pub use progress::progress_bar;
pub use services::well_known_service;
