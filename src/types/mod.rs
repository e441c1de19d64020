//! Core type definitions using newtype patterns for type safety.

mod port;
mod report_id;
mod target;

pub use port::{parse_ports, Port, PortError, PortRange, PortSpec, DEFAULT_PORTS};
pub use report_id::ReportId;
pub use target::{normalize_target, Target};
