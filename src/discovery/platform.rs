//! Host platform detection for the subprocess-backed capabilities.

use std::fmt;
use std::sync::LazyLock;

static CURRENT: LazyLock<Platform> = LazyLock::new(Platform::detect);

/// Family of system tools available on the host.
///
/// Detected once at startup and handed to the prober and the neighbor
/// reader; neither re-detects per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `ping -n 1 -w <ms>` and `arp -a` with dash-separated MACs.
    Windows,
    /// `ping -c 1 -W <secs>` and `ip neigh`, falling back to `arp -an`.
    Unix,
}

impl Platform {
    /// Platform of the running process, detected on first use.
    pub fn current() -> Self {
        *CURRENT
    }

    /// Inspect the build target.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_matches_target() {
        let expected = if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        };
        assert_eq!(Platform::detect(), expected);
        assert_eq!(Platform::current(), expected);
    }
}
