//! Settings persistence.
//!
//! Settings are stored as TOML:
//! - Linux: `~/.config/logstravaganza/settings.toml`
//! - Windows: `%APPDATA%/logstravaganza/settings.toml`
//!
//! `LOGSTRAVAGANZA_CONFIG` overrides the path and `LOGSTRAVAGANZA_VAULT`
//! sets the folder that receives log files (the current directory by
//! default).

use std::path::{Path, PathBuf};

use logstravaganza_console_log::Settings;

/// Environment variable overriding the settings file path.
pub const CONFIG_ENV: &str = "LOGSTRAVAGANZA_CONFIG";

/// Environment variable naming the vault root.
pub const VAULT_ENV: &str = "LOGSTRAVAGANZA_VAULT";

/// Loads settings from `path`, writing the defaults there if it does not
/// exist yet. Missing keys fall back to their defaults.
pub fn load(path: &Path) -> anyhow::Result<Settings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    } else {
        let settings = Settings::default();
        save(path, &settings)?;
        Ok(settings)
    }
}

/// Saves settings to `path`.
pub fn save(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content)?;

    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// Returns the settings file path.
pub fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
            .join("logstravaganza")
            .join("settings.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("logstravaganza")
            .join("settings.toml")
    }
}

/// Returns the vault root that log files are written under.
pub fn vault_root() -> PathBuf {
    std::env::var(VAULT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Name of this device, used in the output file name.
pub fn device_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-device".into())
}
