//! Cooperative shutdown for the long-running tasks.
//!
//! A [`ShutdownTrigger`] (or any clone of it) flips a `watch` flag; every [`ShutdownSignal`]
//! clone observes it. Dropping every trigger counts as a shutdown request.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// How a cancellable sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Shutdown,
}

#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        if !*self.tx.borrow() {
            info!("ShutdownService: Shutdown requested");
        }
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Err means the trigger was dropped, which also ends the wait.
        let _ = rx.wait_for(|&stop| stop).await;
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    pub async fn sleep(&self, duration: Duration) -> Wake {
        if self.is_triggered() {
            return Wake::Shutdown;
        }
        tokio::select! {
            _ = self.cancelled() => Wake::Shutdown,
            _ = tokio::time::sleep(duration) => Wake::Elapsed,
        }
    }
}
