//! Transfer result types
//!
//! Defines the request handed to the engine and the record it returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FtpError;
use crate::error::handlers::error_to_status;
use crate::transfer::TransferType;

/// Which way file bytes flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upload => write!(f, "upload"),
            Direction::Download => write!(f, "download"),
        }
    }
}

/// One file to move between the local filesystem and the server.
///
/// Transfers always start at byte 0.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    local_path: PathBuf,
    remote_path: String,
    direction: Direction,
    transfer_type: TransferType,
}

impl TransferRequest {
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_path: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            direction,
            transfer_type: TransferType::default(),
        }
    }

    pub fn with_transfer_type(mut self, transfer_type: TransferType) -> Self {
        self.transfer_type = transfer_type;
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }
}

/// Terminal status of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    Failed,
    Cancelled,
}

impl TransferStatus {
    /// Status of a finished put/get, whichever way it ended
    pub fn of(outcome: &Result<TransferResult, FtpError>) -> TransferStatus {
        match outcome {
            Ok(result) => result.status,
            Err(err) => error_to_status(err),
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::Success => write!(f, "success"),
            TransferStatus::Failed => write!(f, "failed"),
            TransferStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What a completed or cancelled transfer reports back
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub bytes_transferred: u64,
    pub duration: Duration,
    pub status: TransferStatus,
}

impl TransferResult {
    pub fn success(bytes_transferred: u64, duration: Duration) -> Self {
        Self {
            bytes_transferred,
            duration,
            status: TransferStatus::Success,
        }
    }

    pub fn cancelled(bytes_transferred: u64, duration: Duration) -> Self {
        Self {
            bytes_transferred,
            duration,
            status: TransferStatus::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

/// Lifecycle of a single transfer inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Init,
    Negotiating,
    Transferring,
    Finalizing,
    Done,
    Failed,
    Cancelled,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Done | TransferState::Failed | TransferState::Cancelled
        )
    }
}
