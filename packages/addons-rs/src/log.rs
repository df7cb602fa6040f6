//! Logger handle stored in every built context.
//!
//! The handle is namespaced by the library name and filtered by the level the
//! application asked for. It forwards to `tracing`, so whatever subscriber the
//! host installed decides where the output ends up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Span;

/// Verbosity levels accepted from application definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`LogLevel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level {0:?} (expected trace, debug, info, warn or error)")]
pub struct ParseLogLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLogLevelError;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

/// Arguments for [`Logger::new`].
#[derive(Debug, Clone, Default)]
pub struct LoggerOptions {
    pub name: String,
    pub level: Option<LogLevel>,
}

/// Namespaced, level-filtered logging handle.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    level: LogLevel,
    span: Span,
}

impl Logger {
    pub fn new(options: LoggerOptions) -> Self {
        let level = options.level.unwrap_or_default();
        let span = tracing::info_span!("addons", lib = %options.name, level = %level);
        Self {
            name: options.name,
            level,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Whether a message at `level` would be forwarded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let _entered = self.span.enter();
        match level {
            LogLevel::Trace => tracing::trace!(lib = %self.name, "{message}"),
            LogLevel::Debug => tracing::debug!(lib = %self.name, "{message}"),
            LogLevel::Info => tracing::info!(lib = %self.name, "{message}"),
            LogLevel::Warn => tracing::warn!(lib = %self.name, "{message}"),
            LogLevel::Error => tracing::error!(lib = %self.name, "{message}"),
        }
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!(" warning ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_serde() {
        let level: LogLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, LogLevel::Error);

        let level: LogLevel = serde_json::from_str("\"Warning\"").unwrap();
        assert_eq!(level, LogLevel::Warn);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());

        assert_eq!(serde_json::to_string(&LogLevel::Trace).unwrap(), "\"trace\"");
    }

    #[test]
    fn test_logger_defaults_to_info() {
        let log = Logger::new(LoggerOptions {
            name: "idle-monitor".to_string(),
            level: None,
        });
        assert_eq!(log.name(), "idle-monitor");
        assert_eq!(log.level(), LogLevel::Info);
        assert!(log.enabled(LogLevel::Warn));
        assert!(!log.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_logger_respects_requested_level() {
        let log = Logger::new(LoggerOptions {
            name: "idle-monitor".to_string(),
            level: Some(LogLevel::Trace),
        });
        assert!(log.enabled(LogLevel::Trace));
        log.trace("no subscriber installed, must not panic");
    }
}
