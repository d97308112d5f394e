//! Drains the queue into the output file.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{Mutex, watch};

use crate::formatter::FormatterRegistry;
use crate::queue::{FlushFn, Queue, flush_fn};
use crate::readiness::Readiness;
use crate::settings::{Settings, output_path};
use crate::storage::Storage;
use crate::FlushError;

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Events appended to the file.
    pub written: usize,
    /// Events dropped by the level filter.
    pub filtered: usize,
}

/// Writes queued events to the output file.
///
/// Cycles are serialized by an internal drain lock: if a cycle is still
/// writing when the next timer fires, the new cycle waits for it and then
/// drains whatever is left.
pub struct Flusher {
    storage: Arc<dyn Storage>,
    formatters: FormatterRegistry,
    settings: watch::Receiver<Settings>,
    ready: Readiness,
    basename: String,
    drain_lock: Mutex<()>,
}

impl Flusher {
    pub fn new(
        storage: Arc<dyn Storage>,
        formatters: FormatterRegistry,
        settings: watch::Receiver<Settings>,
        ready: Readiness,
        basename: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            formatters,
            settings,
            ready,
            basename: basename.into(),
            drain_lock: Mutex::new(()),
        }
    }

    /// Runs one flush cycle.
    ///
    /// Settings are read once at the start of the cycle, so changes made
    /// before a flush apply to events already queued. On a storage failure the
    /// event being written goes back to the head of the queue.
    pub async fn flush(&self, queue: &Queue) -> Result<FlushReport, FlushError> {
        self.ready.wait().await?;
        let _guard = self.drain_lock.lock().await;

        let settings = self.settings.borrow().clone();
        let formatter = self
            .formatters
            .get(&settings.formatter_id)
            .ok_or_else(|| FlushError::UnknownFormatter(settings.formatter_id.clone()))?;

        let path = output_path(&settings, &self.basename, formatter.file_ext(), &Local::now());
        self.storage
            .ensure_file(&path, formatter.content_head())
            .await?;

        let mut report = FlushReport::default();
        while let Some(event) = queue.shift() {
            if !event.level().passes(settings.log_level) {
                report.filtered += 1;
                continue;
            }

            let mut line = formatter.format(&event);
            line.push('\n');
            if let Err(e) = self.storage.append(&path, &line).await {
                queue.restore(event);
                return Err(e.into());
            }
            report.written += 1;
        }

        Ok(report)
    }

    /// Waits until no flush cycle is running.
    pub async fn idle(&self) {
        drop(self.drain_lock.lock().await);
    }

    /// Wraps this flusher as the queue's flush callback. Outcomes are logged.
    pub fn into_callback(self: Arc<Self>) -> FlushFn {
        flush_fn(move |queue: Queue| {
            let flusher = Arc::clone(&self);
            async move {
                match flusher.flush(&queue).await {
                    Ok(report) => {
                        tracing::debug!(
                            written = report.written,
                            filtered = report.filtered,
                            "console log flushed"
                        );
                    }
                    Err(FlushError::UnknownFormatter(id)) => {
                        tracing::error!(
                            formatter = %id,
                            queued = queue.len(),
                            "no formatter matches the configured id, flush skipped"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, queued = queue.len(), "console log flush failed");
                    }
                }
            }
        })
    }
}
