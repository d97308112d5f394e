//! Plugin lifecycle: wires settings, queue, flusher and interceptor together.

use std::path::PathBuf;
use std::sync::Arc;

use logstravaganza_console_log::{
    Console, Flusher, FormatterRegistry, Interceptor, Queue, Readiness, Settings, Storage,
    output_path,
};
use logstravaganza_protocol::LogLevel;
use logstravaganza_protocol::constants::{
    FLUSH_DEBOUNCE, PLUGIN_SOURCE, output_basename, prefix_message,
};
use tokio::sync::watch;

use crate::config;

/// A loaded plugin instance. Dropping it without [`Plugin::on_unload`]
/// leaves the console intercepted.
pub struct Plugin<'c> {
    settings: watch::Sender<Settings>,
    settings_path: PathBuf,
    formatters: FormatterRegistry,
    basename: String,
    flusher: Arc<Flusher>,
    interceptor: Interceptor<'c>,
}

impl<'c> Plugin<'c> {
    /// Loads settings, starts intercepting `console` and records the startup
    /// event. Must be called inside a Tokio runtime.
    pub fn on_load(
        console: &'c Console,
        storage: Arc<dyn Storage>,
        ready: Readiness,
        settings_path: PathBuf,
        device: &str,
    ) -> anyhow::Result<Self> {
        let settings = config::load(&settings_path)?;
        let (settings_tx, settings_rx) = watch::channel(settings);

        let formatters = FormatterRegistry::with_builtins();
        let basename = output_basename(device);
        let flusher = Arc::new(Flusher::new(
            storage,
            formatters.clone(),
            settings_rx,
            ready,
            basename.clone(),
        ));

        let queue = Queue::new(FLUSH_DEBOUNCE, Arc::clone(&flusher).into_callback());
        let interceptor = Interceptor::new(console, queue);
        interceptor.setup().store_event(
            LogLevel::Info,
            PLUGIN_SOURCE,
            prefix_message(&format!("Proxy set up (v{})", env!("CARGO_PKG_VERSION"))),
        );

        notice("Logstravaganza is enabled!");

        Ok(Self {
            settings: settings_tx,
            settings_path,
            formatters,
            basename,
            flusher,
            interceptor,
        })
    }

    /// Waits for a pending flush to fire and for the running cycle, if any, to
    /// finish.
    pub async fn settle(&self) {
        while self.queue().is_scheduled() {
            tokio::time::sleep(FLUSH_DEBOUNCE).await;
        }
        self.flusher.idle().await;
    }

    /// Restores the console. Events still queued are discarded.
    pub fn on_unload(&self) {
        self.interceptor.teardown();
        let discarded = self.interceptor.queue().close();
        if discarded > 0 {
            tracing::debug!(discarded, "unflushed console events dropped on unload");
        }
        notice("Logstravaganza is disabled");
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// Applies a settings change and persists it. The change takes effect
    /// with the next flush.
    pub fn update_settings(&self, change: impl FnOnce(&mut Settings)) -> anyhow::Result<()> {
        self.settings.send_modify(change);
        config::save(&self.settings_path, &self.settings())
    }

    /// Ids selectable as `formatter_id`.
    pub fn formatter_ids(&self) -> Vec<&str> {
        self.formatters.ids()
    }

    /// Current output file path, or `None` if the formatter id is unknown.
    pub fn output_path(&self) -> Option<String> {
        let settings = self.settings();
        let formatter = self.formatters.get(&settings.formatter_id)?;
        Some(output_path(
            &settings,
            &self.basename,
            formatter.file_ext(),
            &chrono::Local::now(),
        ))
    }

    pub fn queue(&self) -> &Queue {
        self.interceptor.queue()
    }

    /// Records an event on behalf of the plugin itself.
    pub fn store_event(&self, level: LogLevel, message: &str) {
        self.interceptor
            .store_event(level, PLUGIN_SOURCE, prefix_message(message));
    }
}

/// Transient user notice.
fn notice(text: &str) {
    tracing::info!(notice = text, "{text}");
}
