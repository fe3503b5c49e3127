//! # Logging Utilities
//!
//! Logging infrastructure for symdex using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Pretty output for terminals and JSON output for log collectors
//! - Environment variable configuration with per-invocation overrides
//! - Optional file output next to the console
//!
//! Console logs go to stderr so they never mix with command output on stdout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symdex_utils::init_logging;
//!
//! // Reads RUST_LOG, SYMDEX_LOG_FORMAT and SYMDEX_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Index loaded");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=symdex_core=trace`)
//! - `SYMDEX_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `SYMDEX_LOG_FILE`: Optional log file. A directory gets a dated file
//!   (`YYYY-MM-DD-symdex.log`); any other path rolls daily.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const FORMAT_VAR: &str = "SYMDEX_LOG_FORMAT";
const FILE_VAR: &str = "SYMDEX_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the background file writer alive.
///
/// Buffered file output is flushed when the guard is dropped, so hold it until
/// the program exits.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (default: `info`)
/// - `SYMDEX_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `SYMDEX_LOG_FILE`: Optional log file or directory
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `SYMDEX_LOG_FORMAT` holds an unknown format
/// - The log directory cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(None, None)
}

/// Initialize logging with explicit level and format
///
/// ## Example
///
/// ```rust,no_run
/// use symdex_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(Some(level), Some(format))
}

/// Initialize logging, letting explicit settings override the environment
///
/// Level priority:
/// 1. `level`, when given (a `--log-level` flag)
/// 2. `RUST_LOG` (supports module-specific filters like `symdex_core=trace`)
/// 3. `info`
///
/// Format priority is `format`, then `SYMDEX_LOG_FORMAT`, then pretty.
///
/// ## Errors
///
/// See [`init_logging`].
pub fn init_logging_with(level: Option<LogLevel>, format: Option<LogFormat>) -> Result<LoggingGuard, LoggingError>
{
    let format = match format {
        Some(format) => format,
        None => format_from_env()?,
    };
    let filter = resolve_filter(level);
    let log_file = env::var_os(FILE_VAR).map(PathBuf::from);

    let mut layers: Vec<BoxedLayer> = vec![build_layer(io::stderr, format, true, filter.clone())];
    let mut file_guard = None;

    if let Some(path) = log_file {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(&path)?);
        layers.push(build_layer(writer, format, false, filter));
        file_guard = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard { _file: file_guard })
}

fn format_from_env() -> Result<LogFormat, LoggingError>
{
    match env::var(FORMAT_VAR) {
        Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat),
        Err(_) => Ok(LogFormat::default()),
    }
}

fn resolve_filter(level: Option<LogLevel>) -> EnvFilter
{
    if let Some(level) = level {
        // Explicit level from CLI takes precedence
        return EnvFilter::new(Level::from(level).to_string());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
}

/// Appender for `path`: a dated file inside a directory, otherwise daily rolling.
fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, LoggingError>
{
    if path.is_dir() {
        let today = Utc::now().format("%Y-%m-%d");
        // The date is already in the name, so the file never rolls
        return Ok(tracing_appender::rolling::never(path, format!("{today}-symdex.log")));
    }

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&directory)?;
    let file_name = path.file_name().ok_or_else(|| {
        LoggingError::InvalidFile(format!("{} has no file name", path.display()))
    })?;
    Ok(tracing_appender::rolling::daily(directory, file_name))
}

fn build_layer<W>(writer: W, format: LogFormat, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log file path
    #[error("Invalid log file: {0}")]
    InvalidFile(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("PROD").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("verbose").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_explicit_level_builds_filter()
    {
        let filter = resolve_filter(Some(LogLevel::Debug));
        assert!(filter.to_string().eq_ignore_ascii_case("debug"));
    }

    #[test]
    fn test_default_format_is_pretty()
    {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
