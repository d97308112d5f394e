//! Demo host: feeds stdin lines to the global console while the plugin is
//! loaded.
//!
//! Each line is `<method> <text>` (`debug`, `info`, `log`, `warn`, `error`);
//! lines without a known method are logged with `log`. Lines starting with
//! `:` change settings: `:level <level>`, `:formatter <id>`,
//! `:folder <path>`, `:dated on|off`.

use std::sync::Arc;

use logstravaganza_console_log::{Console, FsStorage, Method, Settings, readiness};
use logstravaganza_protocol::LogLevel;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config;
use crate::plugin::Plugin;

/// Source tag of console calls made from stdin.
const STDIN_SOURCE: &str = "stdin";

/// Runs the host until stdin closes or Ctrl-C is received.
pub async fn run() -> anyhow::Result<()> {
    let console = Console::global();
    let vault = config::vault_root();
    let storage = Arc::new(FsStorage::new(&vault));
    let (layout_ready, ready) = readiness();

    let plugin = Plugin::on_load(
        console,
        storage,
        ready,
        config::settings_path(),
        &config::device_name(),
    )?;

    layout_ready.mark_ready();
    tracing::info!(
        vault = %vault.display(),
        output = plugin.output_path().as_deref().unwrap_or("<unknown formatter>"),
        "host ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&plugin, console, &line),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    // Let the last burst reach the file before the runtime goes away.
    plugin.settle().await;
    plugin.on_unload();
    Ok(())
}

fn handle_line(plugin: &Plugin<'_>, console: &Console, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if let Some(command) = line.strip_prefix(':') {
        match apply_command(plugin, command) {
            Ok(()) => tracing::info!(command, "settings updated"),
            Err(e) => tracing::warn!(command, error = %e, "settings command rejected"),
        }
        return;
    }

    let (method, text) = split_call(line);
    console.call(method, STDIN_SOURCE, &[Value::String(text.to_string())]);
}

/// Splits `<method> <text>`; lines without a known method become `log` calls.
fn split_call(line: &str) -> (Method, &str) {
    if let Some((head, rest)) = line.split_once(char::is_whitespace)
        && let Ok(method) = head.parse::<Method>()
    {
        return (method, rest.trim_start());
    }
    match line.parse::<Method>() {
        Ok(method) => (method, ""),
        Err(_) => (Method::Log, line),
    }
}

fn apply_command(plugin: &Plugin<'_>, command: &str) -> anyhow::Result<()> {
    let (key, value) = command
        .split_once(char::is_whitespace)
        .map(|(k, v)| (k, v.trim()))
        .unwrap_or((command, ""));

    let change = parse_setting(key, value, &plugin.formatter_ids())?;
    plugin.update_settings(change)
}

type SettingChange = Box<dyn FnOnce(&mut Settings)>;

fn parse_setting(key: &str, value: &str, formatter_ids: &[&str]) -> anyhow::Result<SettingChange> {
    match key {
        "level" => {
            let level: LogLevel = value.parse()?;
            Ok(Box::new(move |s: &mut Settings| s.log_level = level))
        }
        "formatter" => {
            if !formatter_ids.contains(&value) {
                anyhow::bail!("unknown formatter {value:?}, expected one of {formatter_ids:?}");
            }
            let id = value.to_string();
            Ok(Box::new(move |s: &mut Settings| s.formatter_id = id))
        }
        "folder" => {
            let folder = value.to_string();
            Ok(Box::new(move |s: &mut Settings| s.output_folder = folder))
        }
        "dated" => {
            let dated = match value {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => anyhow::bail!("expected on/off, got {other:?}"),
            };
            Ok(Box::new(move |s: &mut Settings| s.file_name_contains_date = dated))
        }
        other => anyhow::bail!("unknown setting {other:?}"),
    }
}
