use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a captured console call, ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Returns `true` if an event at this level passes a `min` threshold.
    pub fn passes(self, min: LogLevel) -> bool {
        self >= min
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known log level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    /// Parses a level name, accepting the console aliases `log`, `warning`
    /// and `verbose`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "verbose" => Ok(LogLevel::Debug),
            "info" | "log" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// One captured console call.
///
/// Fields are private: an event never changes after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    source: String,
    message: String,
}

impl LogEvent {
    /// Creates an event stamped with the current time.
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), level, source, message)
    }

    /// Creates an event with an explicit capture time.
    pub fn at(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            source: source.into(),
            message: message.into(),
        }
    }

    /// Returns the event with its timestamp raised to `floor` if it is
    /// earlier.
    pub fn not_before(mut self, floor: DateTime<Utc>) -> Self {
        self.timestamp = self.timestamp.max(floor);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::ALL.iter().max(), Some(&LogLevel::Error));
    }

    #[test]
    fn level_passes_threshold() {
        assert!(LogLevel::Error.passes(LogLevel::Warn));
        assert!(LogLevel::Warn.passes(LogLevel::Warn));
        assert!(!LogLevel::Info.passes(LogLevel::Warn));
        assert!(LogLevel::Debug.passes(LogLevel::Debug));
    }

    #[test]
    fn level_parse_aliases() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("verbose".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("log".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" error ".parse::<LogLevel>().unwrap(), LogLevel::Error);
    }

    #[test]
    fn level_parse_unknown() {
        let err = "trace".parse::<LogLevel>().unwrap_err();
        assert_eq!(err, ParseLevelError("trace".into()));
        assert_eq!(err.to_string(), "unknown log level: \"trace\"");
    }

    #[test]
    fn level_serde_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
        let parsed: LogLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, LogLevel::Error);
    }

    #[test]
    fn event_accessors() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let event = LogEvent::at(ts, LogLevel::Info, "plugin:sync", "hello");
        assert_eq!(event.timestamp(), ts);
        assert_eq!(event.level(), LogLevel::Info);
        assert_eq!(event.source(), "plugin:sync");
        assert_eq!(event.message(), "hello");
    }

    #[test]
    fn not_before_only_raises() {
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap();

        let raised = LogEvent::at(early, LogLevel::Info, "c", "m").not_before(late);
        assert_eq!(raised.timestamp(), late);
        assert_eq!(raised.message(), "m");

        let kept = LogEvent::at(late, LogLevel::Info, "c", "m").not_before(early);
        assert_eq!(kept.timestamp(), late);
    }

    #[test]
    fn event_json_is_camel_case() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let event = LogEvent::at(ts, LogLevel::Error, "console", "boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["source"], "console");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00Z");
    }
}
