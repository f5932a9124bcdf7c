//! Cooperative stop signal
//!
//! A [`StopSignal`] is shared between the Ctrl+C handler and the scheduler.
//! Once raised, the scheduler dispatches no further units; units already in
//! flight run to completion, so their chunk writes stay atomic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a stop signal
pub type SharedStop = Arc<StopSignal>;

#[derive(Debug, Default)]
pub struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStop {
        Arc::new(Self::new())
    }

    /// Request a stop. Wakes all waiters exactly once.
    pub fn request_stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a stop is requested; immediately if it already was
    pub async fn stopped(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent request is not missed.
        notified.as_mut().enable();
        if self.is_stop_requested() {
            return;
        }
        notified.await;
    }
}
