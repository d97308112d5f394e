//! Host readiness gate.
//!
//! The flusher must not touch storage before the host says it is ready. The
//! host keeps the [`ReadySignal`] and flips it once; any number of
//! [`Readiness`] handles can wait on it.

use tokio::sync::watch;

use crate::FlushError;

/// Sending half, owned by the host.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

/// Waiting half, cloned into whoever needs to wait.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

/// Creates a not-yet-ready signal pair.
pub fn readiness() -> (ReadySignal, Readiness) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal { tx }, Readiness { rx })
}

impl ReadySignal {
    /// Marks the host ready. Idempotent.
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Readiness {
    /// A handle that is ready from the start, for hosts without a startup phase.
    pub fn ready() -> Self {
        let (_tx, rx) = watch::channel(true);
        Self { rx }
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the host is ready.
    ///
    /// Fails with [`FlushError::NotReady`] if the signal is dropped first.
    pub async fn wait(&self) -> Result<(), FlushError> {
        if self.is_ready() {
            return Ok(());
        }
        let mut rx = self.rx.clone();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| FlushError::NotReady)
    }
}
