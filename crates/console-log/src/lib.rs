//! Console log capture with debounced, level-filtered flushing.
//!
//! Calls to the [`Console`] are intercepted by an [`Interceptor`], buffered
//! in a [`Queue`], and drained by a [`Flusher`] into an append-only file
//! whose format is chosen from a [`FormatterRegistry`].

mod console;
mod error;
mod flusher;
mod formatter;
mod interceptor;
mod queue;
mod readiness;
mod settings;
mod storage;

pub use console::{Call, Console, Handler, Method, Tagged, handler_fn, render_args};
pub use error::{FlushError, StorageError};
pub use flusher::{FlushReport, Flusher};
pub use formatter::{Formatter, FormatterRegistry, MarkdownTable, NdJson, PlainText};
pub use interceptor::Interceptor;
pub use queue::{FlushFn, FlushFuture, Queue, flush_fn};
pub use readiness::{ReadySignal, Readiness, readiness};
pub use settings::{Settings, normalize_path, output_file_name, output_path};
pub use storage::{FsStorage, MemoryStorage, Storage, StorageFuture};
