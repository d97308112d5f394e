//! Debounced event queue.
//!
//! Buffers captured events in FIFO order and owns a single-slot timer: the
//! first append of a burst arms it, later appends ride along, and the flush
//! callback runs once when it fires.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use logstravaganza_protocol::{LogEvent, LogLevel};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// A boxed future returned by the flush callback.
pub type FlushFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked when the debounce timer fires. It receives a handle to
/// the queue it should drain.
pub type FlushFn = Arc<dyn Fn(Queue) -> FlushFuture + Send + Sync + 'static>;

/// Wraps an async closure as a [`FlushFn`].
pub fn flush_fn<F, Fut>(f: F) -> FlushFn
where
    F: Fn(Queue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |queue: Queue| -> FlushFuture { Box::pin(f(queue)) })
}

/// Ordered buffer of pending log events with a debounced flush trigger.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    state: Mutex<QueueState>,
    on_flush: FlushFn,
    delay: Duration,
    runtime: Handle,
    cycles: AtomicU64,
}

struct QueueState {
    events: VecDeque<LogEvent>,
    /// Armed debounce timer, if any.
    timer: Option<CancellationToken>,
    last_timestamp: Option<DateTime<Utc>>,
    closed: bool,
}

impl Queue {
    /// Creates a queue on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(delay: Duration, on_flush: FlushFn) -> Self {
        Self::with_runtime(Handle::current(), delay, on_flush)
    }

    /// Creates a queue whose debounce timer runs on `runtime`.
    ///
    /// Appends may then come from any thread, including threads that are not
    /// part of a runtime.
    pub fn with_runtime(runtime: Handle, delay: Duration, on_flush: FlushFn) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    events: VecDeque::new(),
                    timer: None,
                    last_timestamp: None,
                    closed: false,
                }),
                on_flush,
                delay,
                runtime,
                cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Adds an event to the tail and arms the flush timer if it is idle.
    ///
    /// An event stamped earlier than the current tail is raised to the tail's
    /// timestamp, so timestamps are non-decreasing in insertion order.
    pub fn append(&self, event: LogEvent) {
        let mut state = self.lock();
        self.push(&mut state, event);
    }

    /// Builds an event stamped with the capture time and appends it.
    ///
    /// The stamp is taken under the queue lock.
    pub fn capture(&self, level: LogLevel, source: &str, message: String) {
        let mut state = self.lock();
        self.push(&mut state, LogEvent::new(level, source, message));
    }

    /// Removes and returns the head event.
    pub fn shift(&self) -> Option<LogEvent> {
        self.lock().events.pop_front()
    }

    /// Puts an event back at the head after a failed write. Does not arm the
    /// timer: the event goes out with the next natural flush.
    pub(crate) fn restore(&self, event: LogEvent) {
        let mut state = self.lock();
        if !state.closed {
            state.events.push_front(event);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Returns `true` while a flush is pending.
    pub fn is_scheduled(&self) -> bool {
        self.lock().timer.is_some()
    }

    /// Number of times the debounce timer has fired.
    pub fn flush_cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::Relaxed)
    }

    /// Disarms the timer and discards queued events. Later appends are
    /// ignored. A flush already in progress is not interrupted.
    ///
    /// Returns the number of discarded events.
    pub fn close(&self) -> usize {
        let mut state = self.lock();
        state.closed = true;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        let discarded = state.events.len();
        state.events.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "console log queue closed with unflushed events");
        }
        discarded
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, state: &mut QueueState, event: LogEvent) {
        if state.closed {
            return;
        }
        let event = match state.last_timestamp {
            Some(last) => event.not_before(last),
            None => event,
        };
        state.last_timestamp = Some(event.timestamp());
        state.events.push_back(event);

        if state.timer.is_none() {
            state.timer = Some(self.arm());
        }
    }

    /// Spawns the one-shot debounce timer. Called with the state lock held.
    fn arm(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let queue = self.clone();

        self.inner.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(queue.inner.delay) => {}
            }

            // Disarm before draining so appends made during the flush arm
            // the next cycle.
            queue.lock().timer = None;
            queue.inner.cycles.fetch_add(1, Ordering::Relaxed);

            let on_flush = Arc::clone(&queue.inner.on_flush);
            on_flush(queue).await;
        });

        cancel
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Queue")
            .field("len", &state.events.len())
            .field("scheduled", &state.timer.is_some())
            .field("closed", &state.closed)
            .finish()
    }
}
