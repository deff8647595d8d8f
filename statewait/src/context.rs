//! Cancellation context for waits
//!
//! A [`Context`] carries a cancellation signal and an optional deadline across
//! async boundaries. The host that drives an operation hands one to the
//! waiter so an interrupt or an outer deadline can stop a poll loop early.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};

/// Request-scoped cancellation signal with an optional deadline.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
    /// Task that cancels a derived context at its deadline.
    watchdog: Option<AbortHandle>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        if let Some(watchdog) = &self.watchdog {
            watchdog.abort();
        }
    }
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done: done_rx,
                done_tx,
                watchdog: None,
            }),
        }
    }

    /// Derives a child that is cancelled when `timeout` elapses or when this
    /// context is cancelled. The child keeps the earlier of the two deadlines.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(parent) if parent < own => parent,
            _ => own,
        };

        let (done_tx, done_rx) = watch::channel(*self.inner.done.borrow());
        let parent = self;
        let inner = Arc::new_cyclic(|child: &Weak<ContextInner>| {
            let child = child.clone();
            let watchdog = tokio::spawn(async move {
                tokio::select! {
                    _ = time::sleep_until(deadline) => {}
                    _ = parent.cancelled() => {}
                }
                if let Some(child) = child.upgrade() {
                    let _ = child.done_tx.send(true);
                }
            });

            ContextInner {
                deadline: Some(deadline),
                done: done_rx,
                done_tx,
                watchdog: Some(watchdog.abort_handle()),
            }
        });

        Self { inner }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline, `None` when the context has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns a receiver that flips to `true` when work done on behalf of
    /// this context should stop.
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        let mut done = self.inner.done.clone();
        // The sender lives in `inner`, so the channel cannot close while `self` is alive.
        let _ = done.wait_for(|cancelled| *cancelled).await;
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
