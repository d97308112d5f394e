pub mod console_log;
pub mod constants;

// Re-export primary types for convenience.
pub use console_log::{LogEvent, LogLevel, ParseLevelError};
