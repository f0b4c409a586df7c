//! Structured logging utilities for the overlay components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use elm_overlay_config::log_resolver_debug;
//!
//! log_resolver_debug!("Substituting manifest", requested = "elm-package.json");
//! ```
//!
//! The shim never installs a subscriber, so inside a host process these
//! events are dropped unless the host itself has one.

use tracing_subscriber::EnvFilter;

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const RESOLVER: &'static str = "RESOLVER";
    pub const FS: &'static str = "FS";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// === RESOLVER logging macros ===

#[macro_export]
macro_rules! log_resolver_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::RESOLVER, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_resolver_trace {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::trace!(component = $crate::logging::Component::RESOLVER, $($key = $value,)* $msg)
    };
}

// === FS logging macros ===

#[macro_export]
macro_rules! log_fs_trace {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::trace!(component = $crate::logging::Component::FS, $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

/// Pick a filter: `ELM_OVERLAY_LOG`, then `RUST_LOG`, then `default`.
pub fn env_filter(default: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(crate::LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default.as_filter()))
}

/// Initialize logging with the given default level.
/// Call this once at application startup.
///
/// Output goes to stderr so stdout stays usable for `eval`.
pub fn init_logging(default: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_constants() {
        assert_eq!(Component::RESOLVER, "RESOLVER");
        assert_eq!(Component::FS, "FS");
        assert_eq!(Component::CLI, "CLI");
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }
}
