//! Diagnostics for readers, decoders and upload backends
//!
//! Every component logs through `Engine` with a `pvr::...` source tag. The
//! installed `Logger` decides where entries go; `DefaultLogger` prints them to
//! stderr. Errors raised with `pvr_err!`/`pvr_bail!` are logged with the
//! file and line that raised them.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Receiver for log entries
///
/// ```no_run
/// use pvr_texture::pvr::log::{Logger, LogEntry};
///
/// struct Silent;
///
/// impl Logger for Silent {
///     fn log(&self, _entry: &LogEntry) {}
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Component tag such as "pvr::formats::Ktx" or "pvr::gles"
    pub source: String,
    pub message: String,
    /// Raising location, set for errors only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-block and per-subresource detail
    Trace,
    Debug,
    Info,
    /// Recoverable surprises, e.g. a decompression fallback
    Warn,
    Error,
}

impl LogSeverity {
    /// Five-character column label
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            Self::Trace => label.bright_black(),
            Self::Debug => label.cyan(),
            Self::Info => label.green(),
            Self::Warn => label.yellow(),
            Self::Error => label.red().bold(),
        }
    }
}

/// Stderr logger: `[time] [SEVERITY] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// The line `log` prints, without colour codes
    pub fn format_plain(entry: &LogEntry) -> String {
        render(entry, entry.severity.label(), &entry.source)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        eprintln!("{}", render(entry, entry.severity.colored_label(), entry.source.bright_blue()));
    }
}

fn render(entry: &LogEntry, severity: impl std::fmt::Display, source: impl std::fmt::Display) -> String {
    let datetime: DateTime<Local> = entry.timestamp.into();
    let mut line = format!(
        "[{}] [{}] [{}] {}",
        datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity,
        source,
        entry.message
    );
    if let (Some(file), Some(number)) = (entry.file, entry.line) {
        line.push_str(&format!(" ({}:{})", file, number));
    }
    line
}

// ===== LOGGING MACROS =====

#[doc(hidden)]
#[macro_export]
macro_rules! __pvr_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::pvr::Engine::log($crate::pvr::log::LogSeverity::$severity, $source, format!($($arg)*))
    };
}

/// ```no_run
/// pvr_texture::pvr_trace!("pvr::decompress", "Decoding block {}", 3);
/// ```
#[macro_export]
macro_rules! pvr_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__pvr_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! pvr_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__pvr_log!(Debug, $source, $($arg)*) };
}

#[macro_export]
macro_rules! pvr_info {
    ($source:expr, $($arg:tt)*) => { $crate::__pvr_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! pvr_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__pvr_log!(Warn, $source, $($arg)*) };
}

/// Error entry carrying the caller's file and line
#[macro_export]
macro_rules! pvr_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::pvr::Engine::log_detailed(
            $crate::pvr::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an error entry and build the `Error` variant with the same message
///
/// ```no_run
/// use pvr_texture::pvr::Error;
/// let err: Error = pvr_texture::pvr_err!(CorruptData, "pvr::formats::Dds", "Header size {}", 12);
/// ```
#[macro_export]
macro_rules! pvr_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::pvr_error!($source, "{}", message);
        $crate::pvr::Error::$variant(message)
    }};
}

/// `return Err(pvr_err!(...))`
#[macro_export]
macro_rules! pvr_bail {
    ($variant:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::pvr_err!($variant, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
