//! Tracing subscriber setup.
//!
//! The CLI's `-v`/`-q` flags pick a [`Verbosity`], which sets the level for
//! both the service's own events and the HTTP request traces from `tower_http`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// The default filter directive for this verbosity.
    #[must_use]
    pub fn default_directive(&self) -> String {
        let level = self.to_level_filter();
        format!("qrvault={level},tower_http={level}")
    }
}

/// Build the filter for `verbosity`, letting a `RUST_LOG`-style directive
/// string take precedence when it parses.
fn build_filter(verbosity: Verbosity, directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.default_directive()))
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG`, when set and valid, overrides the
/// filter derived from `verbosity`.
///
/// ```no_run
/// use qrvault::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let layer = fmt::layer().with_target(true).with_line_number(false);

    // Already installed is fine
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbosity, from_env.as_deref()))
        .with(layer)
        .try_init();
}

/// Warn-level logging routed through the test harness writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
