//! Progress reporting
//!
//! Delivers cumulative byte counts to an optional caller-supplied observer.
//! The transfer only publishes the latest total on a `watch` channel; the
//! observer runs on its own task, so a slow observer sees fewer, coalesced
//! totals instead of slowing the data stream down.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::warn;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Callback invoked with the cumulative number of bytes transferred.
///
/// Totals are strictly increasing and the last one is the final byte count.
/// The callback runs on a separate tokio task; it must not block the thread,
/// since on a current-thread runtime that thread is shared with the transfer.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Publishes totals to the observer task, if there is an observer.
pub(crate) struct ProgressReporter {
    sender: Option<watch::Sender<u64>>,
    delivery: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Must be called within a tokio runtime when `callback` is set.
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        let Some(callback) = callback else {
            return Self {
                sender: None,
                delivery: None,
            };
        };

        let (sender, receiver) = watch::channel(0);
        let delivery = tokio::spawn(deliver(callback, receiver));
        Self {
            sender: Some(sender),
            delivery: Some(delivery),
        }
    }

    /// Never waits on the observer.
    pub(crate) fn report(&self, total: u64) {
        if let Some(sender) = &self.sender {
            sender.send_replace(total);
        }
    }

    /// Stops publishing and waits until the observer has seen the last total.
    pub(crate) async fn finish(&mut self) {
        self.sender.take();
        if let Some(delivery) = self.delivery.take() {
            if let Err(e) = delivery.await {
                warn!("Progress delivery task ended abnormally: {e}");
            }
        }
    }
}

async fn deliver(callback: ProgressCallback, mut receiver: watch::Receiver<u64>) {
    let mut panicked = false;
    // still yields an unseen total after the sender is dropped
    while receiver.changed().await.is_ok() {
        let total = *receiver.borrow_and_update();
        if catch_unwind(AssertUnwindSafe(|| callback(total))).is_err() && !panicked {
            // logged once, later panics are swallowed silently
            panicked = true;
            warn!("Progress observer panicked at {total} bytes; continuing transfer");
        }
    }
}
