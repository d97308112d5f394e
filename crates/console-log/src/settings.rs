//! User settings consumed by the flusher, and output path resolution.

use chrono::{DateTime, TimeZone};
use logstravaganza_protocol::LogLevel;
use logstravaganza_protocol::constants::{
    DEFAULT_FORMATTER_ID, DEFAULT_OUTPUT_FOLDER, OUTPUT_DATE_FORMAT,
};
use serde::{Deserialize, Serialize};

/// Capture settings.
///
/// Missing fields fall back to their defaults, so a partial settings file
/// merges over [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Append the current date and hour to the output file name.
    #[serde(default, alias = "fileNameContainsDate")]
    pub file_name_contains_date: bool,

    /// Id of the formatter used for the output file.
    #[serde(default = "default_formatter_id", alias = "formatterID")]
    pub formatter_id: String,

    /// Vault folder that receives the output file.
    #[serde(default = "default_output_folder", alias = "outputFolder")]
    pub output_folder: String,

    /// Minimum severity written to the file.
    #[serde(default = "default_log_level", alias = "logLevel")]
    pub log_level: LogLevel,
}

fn default_formatter_id() -> String {
    DEFAULT_FORMATTER_ID.into()
}

fn default_output_folder() -> String {
    DEFAULT_OUTPUT_FOLDER.into()
}

fn default_log_level() -> LogLevel {
    LogLevel::Debug
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file_name_contains_date: false,
            formatter_id: default_formatter_id(),
            output_folder: default_output_folder(),
            log_level: default_log_level(),
        }
    }
}

/// Normalizes a vault path.
///
/// Backslashes become slashes, runs of slashes collapse, leading and
/// trailing slashes are dropped and non-breaking spaces become plain spaces.
/// The vault root is `/`.
pub fn normalize_path(path: &str) -> String {
    let cleaned: String = path
        .chars()
        .map(|c| match c {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();

    let joined = cleaned
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() { "/".into() } else { joined }
}

/// Output file name: `<basename>.<ext>`, or `<basename>.<date>.<ext>` when
/// dated, with the date formatted as `YYYY-MM-DD-hhA`.
pub fn output_file_name<Tz>(basename: &str, ext: &str, dated: bool, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if dated {
        format!("{basename}.{}.{ext}", now.format(OUTPUT_DATE_FORMAT))
    } else {
        format!("{basename}.{ext}")
    }
}

/// Full vault path of the output file for the given settings.
pub fn output_path<Tz>(settings: &Settings, basename: &str, ext: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = output_file_name(basename, ext, settings.file_name_contains_date, now);
    normalize_path(&format!("{}/{name}", settings.output_folder))
}
