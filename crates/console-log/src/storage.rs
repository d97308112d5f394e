//! File storage used by the flusher.
//!
//! Paths are vault-relative, `/`-separated strings as produced by
//! [`normalize_path`](crate::normalize_path).

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::AsyncWriteExt;

use crate::StorageError;

/// A boxed future returned by storage operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Asynchronous file service provided by the host.
pub trait Storage: Send + Sync + 'static {
    /// Returns whether a file exists at `path`.
    fn exists<'a>(&'a self, path: &'a str) -> StorageFuture<'a, bool>;

    /// Creates a new file with the given content. Fails if it already exists.
    fn create<'a>(&'a self, path: &'a str, content: &'a str) -> StorageFuture<'a, ()>;

    /// Appends text to an existing file.
    fn append<'a>(&'a self, path: &'a str, text: &'a str) -> StorageFuture<'a, ()>;

    /// Creates the file with `head` as its content unless it already exists.
    fn ensure_file<'a>(&'a self, path: &'a str, head: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if !self.exists(path).await? {
                self.create(path, head).await?;
                tracing::debug!(path, "created console log file");
            }
            Ok(())
        })
    }
}

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a vault-relative path onto the filesystem.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for FsStorage {
    fn exists<'a>(&'a self, path: &'a str) -> StorageFuture<'a, bool> {
        Box::pin(async move { Ok(tokio::fs::try_exists(self.resolve(path)).await?) })
    }

    fn create<'a>(&'a self, path: &'a str, content: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let full = self.resolve(path);
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    return Err(StorageError::AlreadyExists(path.to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            Ok(())
        })
    }

    fn append<'a>(&'a self, path: &'a str, text: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let mut file = match tokio::fs::OpenOptions::new()
                .append(true)
                .open(self.resolve(path))
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(path.to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            file.write_all(text.as_bytes()).await?;
            file.flush().await?;
            Ok(())
        })
    }
}

/// In-memory storage with a switch for failing appends.
///
/// Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, String>>>,
    /// Appends fail once the success count reaches this value.
    fail_at: Arc<Mutex<Option<u64>>>,
    appends: Arc<AtomicU64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content of a file.
    pub fn contents(&self, path: &str) -> Option<String> {
        self.files().get(path).cloned()
    }

    /// Paths of all files, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files().keys().cloned().collect();
        paths.sort_unstable();
        paths
    }

    /// Makes every following append fail with [`StorageError::Injected`], or
    /// clears any injected fault.
    pub fn set_fail_appends(&self, fail: bool) {
        let at = fail.then(|| self.append_count());
        *self.fail_at() = at;
    }

    /// Lets `successes` more appends through, then fails the rest with
    /// [`StorageError::Injected`].
    pub fn fail_appends_after(&self, successes: u64) {
        *self.fail_at() = Some(self.append_count() + successes);
    }

    /// Number of successful appends.
    pub fn append_count(&self) -> u64 {
        self.appends.load(Ordering::SeqCst)
    }

    fn files(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail_at(&self) -> MutexGuard<'_, Option<u64>> {
        self.fail_at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn exists<'a>(&'a self, path: &'a str) -> StorageFuture<'a, bool> {
        Box::pin(async move { Ok(self.files().contains_key(path)) })
    }

    fn create<'a>(&'a self, path: &'a str, content: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let mut files = self.files();
            if files.contains_key(path) {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            files.insert(path.to_string(), content.to_string());
            Ok(())
        })
    }

    fn append<'a>(&'a self, path: &'a str, text: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let fail_at = *self.fail_at();
            if fail_at.is_some_and(|at| self.append_count() >= at) {
                return Err(StorageError::Injected);
            }
            let mut files = self.files();
            let file = files
                .get_mut(path)
                .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
            file.push_str(text);
            self.appends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
