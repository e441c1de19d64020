//! Configuration management for reconlab.
//!
//! Provides XDG-compliant settings storage. Command line flags override
//! whatever is loaded here.

mod settings;

pub use settings::{AppSettings, Paths};
