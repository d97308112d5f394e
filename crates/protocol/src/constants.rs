use std::time::Duration;

/// Delay between the first queued event of a burst and the flush it triggers.
///
/// Every event appended while the timer is pending rides along with the same
/// flush, so a burst of console output costs one file append cycle.
pub const FLUSH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Prefix of the output file basename (`console-log.<device>`).
pub const OUTPUT_BASENAME_PREFIX: &str = "console-log";

/// chrono format of the date part of dated output files (`YYYY-MM-DD-hhA`).
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d-%I%p";

/// Source tag used for events the plugin stores about itself.
pub const PLUGIN_SOURCE: &str = "plugin:logstravaganza";

/// Prefix prepended to messages the plugin stores about itself.
pub const MESSAGE_PREFIX: &str = "Logstravaganza: ";

/// Formatter selected when no settings exist yet.
pub const DEFAULT_FORMATTER_ID: &str = "mdtable";

/// Output folder used when no settings exist yet (the vault root).
pub const DEFAULT_OUTPUT_FOLDER: &str = "/";

/// Builds the output file basename for a device.
pub fn output_basename(device: &str) -> String {
    format!("{OUTPUT_BASENAME_PREFIX}.{device}")
}

/// Prefixes a plugin message so it stands out among captured console output.
pub fn prefix_message(msg: &str) -> String {
    format!("{MESSAGE_PREFIX}{msg}")
}
