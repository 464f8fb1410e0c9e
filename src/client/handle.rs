//! Module `handle`
//!
//! The caller's view of a running put/get.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{FtpError, Result};
use crate::transfer::TransferResult;

/// A transfer running on its own tokio task.
///
/// Awaiting the handle yields the terminal outcome. Dropping it detaches the
/// task, which keeps running to completion.
#[derive(Debug)]
pub struct TransferHandle {
    task: JoinHandle<Result<TransferResult>>,
    cancel: CancellationToken,
}

impl TransferHandle {
    pub(crate) fn new(task: JoinHandle<Result<TransferResult>>, cancel: CancellationToken) -> Self {
        Self { task, cancel }
    }

    /// Requests cancellation; the transfer stops before its next chunk.
    /// Safe to call repeatedly and after completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Aborts the task outright instead of waiting for a chunk boundary.
    /// Sockets are closed on drop and the handle resolves to `Cancelled`.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Future for TransferHandle {
    type Output = Result<TransferResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(FtpError::Cancelled),
            Err(e) => Err(FtpError::Transfer(format!("transfer task failed: {e}"))),
        })
    }
}
