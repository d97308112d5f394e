//! Output formatters.
//!
//! A formatter turns one [`LogEvent`] into one line of the output file and
//! decides the file's extension and header. Formatters are looked up by id,
//! so new ones can be registered without touching the flusher.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use logstravaganza_protocol::LogEvent;

/// Converts log events to lines of text.
pub trait Formatter: Send + Sync + 'static {
    /// Identifier selected through the `formatter_id` setting.
    fn id(&self) -> &str;

    /// Extension of the output file, without the leading dot.
    fn file_ext(&self) -> &str;

    /// Text written once when a new output file is created.
    fn content_head(&self) -> &str;

    /// Formats one event as a single line without a trailing newline.
    fn format(&self, event: &LogEvent) -> String;
}

/// Formatters keyed by id.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `mdtable`, `ndjson` and `plaintext`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MarkdownTable));
        registry.register(Arc::new(NdJson));
        registry.register(Arc::new(PlainText));
        registry
    }

    /// Registers a formatter, replacing any previous one with the same id.
    pub fn register(&mut self, formatter: Arc<dyn Formatter>) {
        self.formatters.insert(formatter.id().to_string(), formatter);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Formatter>> {
        self.formatters.get(id).cloned()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

fn iso_timestamp(event: &LogEvent) -> String {
    event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Markdown table, one row per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTable;

impl MarkdownTable {
    pub const ID: &'static str = "mdtable";
    pub const HEAD: &'static str = "| Timestamp | Originator | Level | Message |\n\
                                    | --------- | ---------- | ----- | ------- |\n";

    fn cell(text: &str) -> String {
        text.replace('|', "\\|")
            .replace("\r\n", "<br>")
            .replace(['\r', '\n'], "<br>")
    }
}

impl Formatter for MarkdownTable {
    fn id(&self) -> &str {
        Self::ID
    }

    fn file_ext(&self) -> &str {
        "md"
    }

    fn content_head(&self) -> &str {
        Self::HEAD
    }

    fn format(&self, event: &LogEvent) -> String {
        format!(
            "| {} | {} | {} | {} |",
            iso_timestamp(event),
            Self::cell(event.source()),
            event.level(),
            Self::cell(event.message()),
        )
    }
}

/// Newline-delimited JSON, one object per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdJson;

impl NdJson {
    pub const ID: &'static str = "ndjson";
}

impl Formatter for NdJson {
    fn id(&self) -> &str {
        Self::ID
    }

    fn file_ext(&self) -> &str {
        "ndjson"
    }

    fn content_head(&self) -> &str {
        ""
    }

    fn format(&self, event: &LogEvent) -> String {
        serde_json::to_string(event).unwrap_or_default()
    }
}

/// Classic `[time] [LEVEL] source: message` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl PlainText {
    pub const ID: &'static str = "plaintext";

    fn escape(text: &str) -> String {
        text.replace('\r', "\\r").replace('\n', "\\n")
    }
}

impl Formatter for PlainText {
    fn id(&self) -> &str {
        Self::ID
    }

    fn file_ext(&self) -> &str {
        "log"
    }

    fn content_head(&self) -> &str {
        ""
    }

    fn format(&self, event: &LogEvent) -> String {
        format!(
            "[{}] [{}] {}: {}",
            iso_timestamp(event),
            event.level().as_str().to_ascii_uppercase(),
            Self::escape(event.source()),
            Self::escape(event.message()),
        )
    }
}
