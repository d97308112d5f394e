//! The console logging surface.
//!
//! A [`Console`] exposes the familiar `debug`/`info`/`log`/`warn`/`error`
//! methods. Each method dispatches to a handler slot that can be swapped at
//! runtime, which is how the [`Interceptor`](crate::Interceptor) observes
//! calls without changing what the original handlers do.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use logstravaganza_protocol::{LogLevel, ParseLevelError};
use serde_json::Value;

/// A console method that can be intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Debug,
    Info,
    Log,
    Warn,
    Error,
}

impl Method {
    /// Every method, in slot order.
    pub const ALL: [Method; 5] = [
        Method::Debug,
        Method::Info,
        Method::Log,
        Method::Warn,
        Method::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Debug => "debug",
            Method::Info => "info",
            Method::Log => "log",
            Method::Warn => "warn",
            Method::Error => "error",
        }
    }

    /// Severity recorded for calls to this method. `log` counts as `info`.
    pub fn level(self) -> LogLevel {
        match self {
            Method::Debug => LogLevel::Debug,
            Method::Info | Method::Log => LogLevel::Info,
            Method::Warn => LogLevel::Warn,
            Method::Error => LogLevel::Error,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Method::Debug),
            "info" => Ok(Method::Info),
            "log" => Ok(Method::Log),
            "warn" => Ok(Method::Warn),
            "error" => Ok(Method::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// One invocation of a console method.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub method: Method,
    /// Originating context: an explicit tag, or the caller's source file.
    pub source: &'a str,
    pub args: &'a [Value],
}

/// Handler installed in a console method slot.
pub type Handler = Arc<dyn Fn(&Call<'_>) + Send + Sync + 'static>;

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&Call<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

static GLOBAL: LazyLock<Console> = LazyLock::new(Console::new);

/// A console with one replaceable handler per [`Method`].
pub struct Console {
    slots: [RwLock<Handler>; 5],
}

impl Console {
    /// Creates a console whose handlers print to stdout/stderr.
    pub fn new() -> Self {
        Self {
            slots: Method::ALL.map(|method| RwLock::new(default_handler(method))),
        }
    }

    /// The process-wide console.
    pub fn global() -> &'static Console {
        &GLOBAL
    }

    /// Returns the handler currently installed for `method`.
    pub fn handler(&self, method: Method) -> Handler {
        let slot = self.slots[method.slot()]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Installs `handler` for `method`, returning the one it replaced.
    pub fn replace(&self, method: Method, handler: Handler) -> Handler {
        let mut slot = self.slots[method.slot()]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, handler)
    }

    /// Dispatches a call to the handler installed for `method`.
    ///
    /// The slot lock is released before the handler runs, so handlers may
    /// log to the console themselves.
    pub fn call(&self, method: Method, source: &str, args: &[Value]) {
        let handler = self.handler(method);
        handler(&Call {
            method,
            source,
            args,
        });
    }

    /// Returns a view of this console that tags every call with `source`.
    pub fn tagged<'a>(&'a self, source: &'a str) -> Tagged<'a> {
        Tagged {
            console: self,
            source,
        }
    }

    #[track_caller]
    pub fn debug(&self, args: &[Value]) {
        self.call(Method::Debug, Location::caller().file(), args);
    }

    #[track_caller]
    pub fn info(&self, args: &[Value]) {
        self.call(Method::Info, Location::caller().file(), args);
    }

    #[track_caller]
    pub fn log(&self, args: &[Value]) {
        self.call(Method::Log, Location::caller().file(), args);
    }

    #[track_caller]
    pub fn warn(&self, args: &[Value]) {
        self.call(Method::Warn, Location::caller().file(), args);
    }

    #[track_caller]
    pub fn error(&self, args: &[Value]) {
        self.call(Method::Error, Location::caller().file(), args);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// A [`Console`] view with a fixed source tag.
#[derive(Debug, Clone, Copy)]
pub struct Tagged<'a> {
    console: &'a Console,
    source: &'a str,
}

impl Tagged<'_> {
    pub fn debug(&self, args: &[Value]) {
        self.console.call(Method::Debug, self.source, args);
    }

    pub fn info(&self, args: &[Value]) {
        self.console.call(Method::Info, self.source, args);
    }

    pub fn log(&self, args: &[Value]) {
        self.console.call(Method::Log, self.source, args);
    }

    pub fn warn(&self, args: &[Value]) {
        self.console.call(Method::Warn, self.source, args);
    }

    pub fn error(&self, args: &[Value]) {
        self.console.call(Method::Error, self.source, args);
    }
}

fn default_handler(method: Method) -> Handler {
    match method {
        Method::Warn | Method::Error => handler_fn(|call| {
            eprintln!("[{}] {}", call.method, render_args(call.args));
        }),
        _ => handler_fn(|call| {
            println!("[{}] {}", call.method, render_args(call.args));
        }),
    }
}

/// Renders console arguments into a single message.
///
/// Arguments are joined with a space. If the first argument carries `%c`
/// styling directives, the directives are removed and the CSS arguments they
/// refer to are consumed.
pub fn render_args(args: &[Value]) -> String {
    let Some(first) = args.first() else {
        return String::new();
    };

    let first_text = arg_text(first);
    if !first_text.contains("%c") {
        return args.iter().map(arg_text).collect::<Vec<_>>().join(" ");
    }

    let directives = first_text.matches("%c").count();
    let head = first_text.replace("%c", "");
    let mut parts = Vec::with_capacity(args.len());
    if !head.is_empty() {
        parts.push(head);
    }
    parts.extend(args.iter().skip(1 + directives).map(arg_text));
    parts.join(" ")
}

fn arg_text(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        Value::Null => "null".into(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recording(console: &Console, method: Method) -> Arc<Mutex<Vec<(String, String)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        console.replace(
            method,
            handler_fn(move |call| {
                sink.lock()
                    .unwrap()
                    .push((call.source.to_string(), render_args(call.args)));
            }),
        );
        seen
    }

    #[test]
    fn method_levels() {
        assert_eq!(Method::Debug.level(), LogLevel::Debug);
        assert_eq!(Method::Info.level(), LogLevel::Info);
        assert_eq!(Method::Log.level(), LogLevel::Info);
        assert_eq!(Method::Warn.level(), LogLevel::Warn);
        assert_eq!(Method::Error.level(), LogLevel::Error);
    }

    #[test]
    fn method_parse() {
        assert_eq!("log".parse::<Method>().unwrap(), Method::Log);
        assert_eq!("WARN".parse::<Method>().unwrap(), Method::Warn);
        assert!("trace".parse::<Method>().is_err());
    }

    #[test]
    fn render_plain_args() {
        let args = [json!("hello"), json!("world")];
        assert_eq!(render_args(&args), "hello world");
    }

    #[test]
    fn render_non_string_args() {
        let args = [json!(42), json!(true), json!(null), json!({"a": 1})];
        assert_eq!(render_args(&args), "42 true null {\"a\":1}");
    }

    #[test]
    fn render_empty_args() {
        assert_eq!(render_args(&[]), "");
    }

    #[test]
    fn render_styled_args_drops_css() {
        let args = [json!("%cHello%c World"), json!("color: red"), json!("color: blue")];
        assert_eq!(render_args(&args), "Hello World");
    }

    #[test]
    fn render_styled_with_trailing_args() {
        let args = [json!("%cStyled"), json!("color: red"), json!("extra text")];
        assert_eq!(render_args(&args), "Styled extra text");
    }

    #[test]
    fn render_keeps_empty_string_args() {
        assert_eq!(render_args(&[json!("a"), json!(""), json!("b")]), "a  b");
        let styled = [json!("%cStyled"), json!("color: red"), json!(""), json!("x")];
        assert_eq!(render_args(&styled), "Styled  x");
    }

    #[test]
    fn render_style_only_head_is_dropped() {
        let args = [json!("%c"), json!("color: red"), json!("after")];
        assert_eq!(render_args(&args), "after");
    }

    #[test]
    fn call_dispatches_to_slot() {
        let console = Console::new();
        let seen = recording(&console, Method::Warn);

        console.tagged("plugin:sync").warn(&[json!("careful")]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("plugin:sync".to_string(), "careful".to_string())]);
    }

    #[test]
    fn untagged_call_infers_caller_file() {
        let console = Console::new();
        let seen = recording(&console, Method::Info);

        console.info(&[json!("hi")]);

        let seen = seen.lock().unwrap();
        assert!(seen[0].0.ends_with("console.rs"), "source was {}", seen[0].0);
    }

    #[test]
    fn replace_returns_previous_handler() {
        let console = Console::new();
        let original = console.handler(Method::Error);
        let noop = handler_fn(|_| {});

        let previous = console.replace(Method::Error, Arc::clone(&noop));
        assert!(Arc::ptr_eq(&previous, &original));
        assert!(Arc::ptr_eq(&console.handler(Method::Error), &noop));
    }

    #[test]
    fn handler_may_log_recursively() {
        let console = Arc::new(Console::new());
        let seen = recording(&console, Method::Debug);
        let inner = Arc::clone(&console);
        console.replace(
            Method::Info,
            handler_fn(move |call| inner.call(Method::Debug, call.source, call.args)),
        );

        console.tagged("t").info(&[json!("nested")]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
