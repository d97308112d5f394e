//! Console interception.
//!
//! [`Interceptor::setup`] wraps every console method so that each call still
//! reaches the original handler and is also recorded in the [`Queue`].
//! [`Interceptor::teardown`] puts the original handlers back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use logstravaganza_protocol::LogLevel;

use crate::console::{Console, Handler, Method, handler_fn, render_args};
use crate::queue::Queue;

/// Installs and removes the console wrappers.
pub struct Interceptor<'c> {
    console: &'c Console,
    queue: Queue,
    /// Handlers replaced by `setup`, in [`Method::ALL`] order.
    originals: Mutex<Option<Vec<Handler>>>,
}

impl<'c> Interceptor<'c> {
    pub fn new(console: &'c Console, queue: Queue) -> Self {
        Self {
            console,
            queue,
            originals: Mutex::new(None),
        }
    }

    /// Wraps every console method. Does nothing if already set up.
    ///
    /// Returns `self` so startup events can be stored right away.
    pub fn setup(&self) -> &Self {
        let mut originals = self.originals();
        if originals.is_some() {
            return self;
        }

        let saved = Method::ALL
            .iter()
            .map(|&method| {
                let original = self.console.handler(method);
                let wrapper = wrap(Arc::clone(&original), self.queue.clone());
                self.console.replace(method, wrapper);
                original
            })
            .collect();
        *originals = Some(saved);

        tracing::debug!("console methods intercepted");
        self
    }

    /// Restores the original console methods. Safe to call repeatedly or
    /// without a prior [`setup`](Self::setup).
    pub fn teardown(&self) {
        let Some(saved) = self.originals().take() else {
            return;
        };
        for (method, original) in Method::ALL.into_iter().zip(saved) {
            self.console.replace(method, original);
        }
        tracing::debug!("console methods restored");
    }

    pub fn is_active(&self) -> bool {
        self.originals().is_some()
    }

    /// Records an event without going through the console.
    pub fn store_event(&self, level: LogLevel, source: &str, message: impl Into<String>) {
        self.queue.capture(level, source, message.into());
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    fn originals(&self) -> MutexGuard<'_, Option<Vec<Handler>>> {
        self.originals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds a handler that forwards to `original`, then queues the call.
fn wrap(original: Handler, queue: Queue) -> Handler {
    handler_fn(move |call| {
        original(call);
        queue.capture(call.method.level(), call.source, render_args(call.args));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::flush_fn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn idle_queue() -> Queue {
        Queue::new(Duration::from_secs(60), flush_fn(|_| async {}))
    }

    fn counting(console: &Console) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        for method in Method::ALL {
            let count = Arc::clone(&count);
            console.replace(
                method,
                handler_fn(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        count
    }

    #[tokio::test]
    async fn calls_reach_original_and_queue() {
        let console = Console::new();
        let original_calls = counting(&console);
        let interceptor = Interceptor::new(&console, idle_queue());
        interceptor.setup();

        console.tagged("plugin:sync").info(&[json!("hello"), json!(42)]);
        console.tagged("plugin:sync").log(&[json!("plain")]);
        console.tagged("core").error(&[json!("boom")]);

        assert_eq!(original_calls.load(Ordering::SeqCst), 3);

        let queue = interceptor.queue();
        let first = queue.shift().unwrap();
        assert_eq!(first.level(), LogLevel::Info);
        assert_eq!(first.source(), "plugin:sync");
        assert_eq!(first.message(), "hello 42");
        assert_eq!(queue.shift().unwrap().level(), LogLevel::Info);
        let third = queue.shift().unwrap();
        assert_eq!(third.level(), LogLevel::Error);
        assert_eq!(third.source(), "core");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn teardown_restores_exact_handlers() {
        let console = Console::new();
        let before: Vec<Handler> = Method::ALL.iter().map(|&m| console.handler(m)).collect();

        let interceptor = Interceptor::new(&console, idle_queue());
        interceptor.setup();
        assert!(!Arc::ptr_eq(&console.handler(Method::Warn), &before[3]));

        interceptor.teardown();
        interceptor.teardown();

        for (method, original) in Method::ALL.iter().zip(&before) {
            assert!(Arc::ptr_eq(&console.handler(*method), original), "{method} not restored");
        }
        assert!(!interceptor.is_active());
    }

    #[tokio::test]
    async fn teardown_without_setup_is_noop() {
        let console = Console::new();
        let before = console.handler(Method::Info);
        let interceptor = Interceptor::new(&console, idle_queue());

        interceptor.teardown();
        assert!(Arc::ptr_eq(&console.handler(Method::Info), &before));
    }

    #[tokio::test]
    async fn calls_after_teardown_are_not_queued() {
        let console = Console::new();
        counting(&console);
        let interceptor = Interceptor::new(&console, idle_queue());
        interceptor.setup();
        interceptor.teardown();

        console.tagged("x").warn(&[json!("ignored")]);
        assert!(interceptor.queue().is_empty());
    }

    #[tokio::test]
    async fn setup_twice_does_not_double_wrap() {
        let console = Console::new();
        counting(&console);
        let interceptor = Interceptor::new(&console, idle_queue());
        interceptor.setup();
        interceptor.setup();

        console.tagged("x").debug(&[json!("once")]);
        assert_eq!(interceptor.queue().len(), 1);
    }

    #[tokio::test]
    async fn store_event_bypasses_console() {
        let console = Console::new();
        let original_calls = counting(&console);
        let interceptor = Interceptor::new(&console, idle_queue());

        interceptor
            .setup()
            .store_event(LogLevel::Info, "plugin:logstravaganza", "Proxy set up");

        assert_eq!(original_calls.load(Ordering::SeqCst), 0);
        let event = interceptor.queue().shift().unwrap();
        assert_eq!(event.source(), "plugin:logstravaganza");
        assert_eq!(event.message(), "Proxy set up");
    }

    #[tokio::test]
    async fn original_panic_propagates_and_skips_event() {
        let console = Console::new();
        console.replace(
            Method::Error,
            handler_fn(|_| panic!("original handler failed")),
        );
        let interceptor = Interceptor::new(&console, idle_queue());
        interceptor.setup();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            console.tagged("x").error(&[json!("boom")]);
        }));

        assert!(result.is_err());
        assert!(interceptor.queue().is_empty());
    }
}
