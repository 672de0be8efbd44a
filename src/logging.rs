//! Structured logging utilities for scache
//!
//! This module provides consistent logging patterns across the codebase.
//! All logs use structured fields for easy parsing and analysis.
//!
//! # Log Format Conventions
//!
//! - `operation`: The operation being performed (e.g., "load", "save", "compute")
//! - `status`: The result status ("success", "miss", "skipped")
//! - `rule`: The cache rule being run
//! - `file`: Record file name
//! - `path`: Attribute path inside the container (e.g., `uns['pca']['variance']`)
//!
//! # Examples
//!
//! ```rust
//! use scache::logging::{operations, status};
//! use tracing::info;
//!
//! let file = "pca.bincode";
//! info!(
//!     operation = operations::LOAD,
//!     status = status::SUCCESS,
//!     rule = "pca",
//!     file,
//!     "Loading data from: `{}`",
//!     file
//! );
//! ```

use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// Custom formatter that shows "scache" instead of full module path
struct ScacheFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for ScacheFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        )?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m", // Red
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::TRACE => "\x1b[35m", // Magenta
            };
            write!(writer, "{}{:5}(scache)\x1b[0m: ", level_style, meta.level())?;
        } else {
            write!(writer, "{:5}(scache): ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format (default for development)
    Pretty,
    /// Compact format (for CI/production)
    Compact,
    /// JSON format (for log aggregation systems)
    Json,
}

impl LogFormat {
    /// Parse a format name, `None` for unknown names
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Parse from environment variable (SCACHE_LOG_FORMAT)
    pub fn from_env() -> Self {
        Self::resolve(None)
    }

    /// `SCACHE_LOG_FORMAT` first, then the configured format, then the default
    pub fn resolve(configured: Option<Self>) -> Self {
        std::env::var("SCACHE_LOG_FORMAT")
            .ok()
            .and_then(|v| Self::parse(&v))
            .or(configured)
            .unwrap_or_else(|| {
                // Default: pretty for dev, compact for production/CI
                if std::env::var("CI").is_ok() {
                    Self::Compact
                } else {
                    Self::Pretty
                }
            })
    }
}

/// Initialize the global tracing subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "debug", "info", "warn"), overrides `default_level`
/// - `SCACHE_LOG_FORMAT`: Set format ("pretty", "compact", "json")
/// - `CI`: If set, defaults to compact format
///
/// `format` is the configured format, used when `SCACHE_LOG_FORMAT` is unset.
pub fn init(default_level: &str, format: Option<LogFormat>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = LogFormat::resolve(format);

    // A subscriber may already be installed (e.g. by an embedding application)
    let result = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(ScacheFormatter { with_ansi: true })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(ScacheFormatter { with_ansi: false })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already initialized: {}", e);
    }
}

/// Operation names for consistent logging
pub mod operations {
    pub const LOAD: &str = "load";
    pub const SAVE: &str = "save";
    pub const COMPUTE: &str = "compute";
    pub const RESOLVE: &str = "resolve";
    pub const CLEAR: &str = "clear";
}

/// Status values for consistent logging
pub mod status {
    pub const SUCCESS: &str = "success";
    pub const MISS: &str = "miss";
    pub const FORCED: &str = "forced";
    pub const SKIPPED: &str = "skipped";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_log_format() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("fancy"), None);
    }

    #[test]
    #[serial]
    fn test_log_format_from_env() {
        std::env::set_var("SCACHE_LOG_FORMAT", "json");
        assert_eq!(LogFormat::from_env(), LogFormat::Json);

        std::env::set_var("SCACHE_LOG_FORMAT", "compact");
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);

        std::env::remove_var("SCACHE_LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_env_overrides_configured_format() {
        std::env::remove_var("SCACHE_LOG_FORMAT");
        assert_eq!(LogFormat::resolve(Some(LogFormat::Json)), LogFormat::Json);

        std::env::set_var("SCACHE_LOG_FORMAT", "compact");
        assert_eq!(LogFormat::resolve(Some(LogFormat::Json)), LogFormat::Compact);

        std::env::remove_var("SCACHE_LOG_FORMAT");
    }
}
