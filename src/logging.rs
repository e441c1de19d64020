//! Logging setup using `tracing`.
//!
//! Logs go to stderr so that results printed on stdout stay clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Include the module path in each line.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Pick the level from the global verbosity flags, falling back to the
    /// configured default.
    pub fn from_flags(verbose: bool, quiet: bool, default_level: &str) -> Self {
        let level = if verbose {
            "debug"
        } else if quiet {
            "warn"
        } else {
            default_level
        };
        Self::new().level(level).with_target(verbose)
    }

    /// Include module paths.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(config: LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_from_flags() {
        assert_eq!(LogConfig::from_flags(true, true, "info").level, "debug");
        assert_eq!(LogConfig::from_flags(false, true, "info").level, "warn");
        assert_eq!(LogConfig::from_flags(false, false, "error").level, "error");
    }

    #[test]
    fn test_init_twice() {
        init(LogConfig::new().level("off"));
        init(LogConfig::new().level("off"));
    }
}
