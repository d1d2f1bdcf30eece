//! In-flight stream tracking and graceful drain.
//!
//! Every streaming RPC holds a [`StreamGuard`] for as long as its task runs.
//! On shutdown the [`StreamTracker`] refuses new streams, waits for the
//! in-flight count to reach zero (bounded by the configured drain timeout) and
//! then cancels whatever is still running through a shared
//! [`CancellationToken`].

use crate::server::telemetry::{
    decrement_streams_inflight, increment_streams_inflight, record_stream_duration,
};
use consignment_core::Error;
use core::time::Duration;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

pub struct StreamTracker {
    inflight: AtomicUsize,
    shutting_down: AtomicBool,
    shutdown_token: CancellationToken,
    drain_timeout: Duration,
}

impl StreamTracker {
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            inflight: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            shutdown_token: CancellationToken::new(),
            drain_timeout,
        }
    }

    /// Registers a new stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] once [`StreamTracker::shutdown`] has
    /// started.
    pub fn admit(self: &Arc<Self>) -> Result<StreamGuard, Error> {
        // SeqCst pairs with `shutdown`: either it sees this increment or we see its flag.
        self.inflight.fetch_add(1, Ordering::SeqCst);
        if self.shutting_down.load(Ordering::SeqCst) {
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ServiceShutdown);
        }

        increment_streams_inflight();
        Ok(StreamGuard {
            tracker: Arc::clone(self),
            started: Instant::now(),
        })
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Token cancelled when the drain timeout expires during shutdown.
    pub fn cancellation(&self) -> CancellationToken {
        self.shutdown_token.child_token()
    }

    /// Stops admitting streams, drains in-flight ones and cancels the rest.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new streams ===
        tracing::info!("Refusing new streams");
        self.shutting_down.store(true, Ordering::SeqCst);

        // === Phase 1: Wait for in-flight streams to drain ===
        tracing::info!("Draining in-flight streams ({} active)", self.inflight());
        let drained = timeout(self.drain_timeout, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight streams drained"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.inflight()
            ),
        }

        // === Phase 2: Cancel whatever is left ===
        self.shutdown_token.cancel();
        tracing::info!("Stream shutdown complete");
    }
}

/// Keeps a stream counted as in flight until dropped.
pub struct StreamGuard {
    tracker: Arc<StreamTracker>,
    started: Instant,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.tracker.inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
        record_stream_duration(self.started.elapsed().as_secs_f64() * 1_000.0);
    }
}
