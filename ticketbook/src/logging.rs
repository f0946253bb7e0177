//! Logging infrastructure for the ticketbook library.
//!
//! The library itself only emits records through the [`log`] facade. This
//! module provides the stderr sink the CLI installs behind it, with three
//! coarse verbosity levels.

use std::env;
use std::fmt;

use log::{LevelFilter, Metadata, Record};

/// Environment variable consulted by [`init_logger`] when no flag is given.
pub const LOG_MODE_ENV: &str = "TICKETBOOK_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use ticketbook::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all log output.
    Quiet,
    /// Errors and warnings.
    Normal,
    /// Errors, warnings, info and debug messages.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use ticketbook::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The `log` filter matching this level.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Off,
            Self::Normal => LevelFilter::Warn,
            Self::Verbose => LevelFilter::Debug,
        }
    }
}

/// A stderr logger writing `LEVEL: message` lines.
///
/// # Examples
///
/// ```
/// use ticketbook::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.error("This is an error message");
/// logger.info("This will not be printed (requires Verbose)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LogLevel,
}

static GLOBAL_SINK: Logger = Logger::new(LogLevel::Verbose);

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Logs an error message, unless the level is Quiet.
    pub fn error(&self, message: &str) {
        self.emit(log::Level::Error, message);
    }

    /// Logs a warning message, unless the level is Quiet.
    pub fn warn(&self, message: &str) {
        self.emit(log::Level::Warn, message);
    }

    /// Logs an informational message at Verbose level.
    pub fn info(&self, message: &str) {
        self.emit(log::Level::Info, message);
    }

    /// Logs a debug message at Verbose level.
    pub fn debug(&self, message: &str) {
        self.emit(log::Level::Debug, message);
    }

    fn emit(&self, level: log::Level, message: &str) {
        if level <= self.level.filter() {
            eprintln!("{}: {message}", level.as_str());
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level.filter()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level().as_str(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Resolves the log level from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet; verbose wins if both are set)
/// 2. `TICKETBOOK_LOG_MODE` environment variable
/// 3. Default (Normal)
#[must_use]
pub fn resolve_log_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    env::var(LOG_MODE_ENV)
        .ok()
        .and_then(|value| LogLevel::parse(&value).ok())
        .unwrap_or(LogLevel::Normal)
}

/// Resolves the log level and routes `log` records to stderr.
///
/// Safe to call more than once: the sink is installed on the first call and
/// later calls only adjust the maximum level.
///
/// # Examples
///
/// ```
/// use ticketbook::{init_logger, LogLevel};
///
/// let logger = init_logger(false, true);
/// assert_eq!(logger.level(), LogLevel::Quiet);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    let level = resolve_log_level(verbose, quiet);
    // Fails only if a logger is already installed
    let _ = log::set_logger(&GLOBAL_SINK);
    log::set_max_level(level.filter());
    Logger::new(level)
}
