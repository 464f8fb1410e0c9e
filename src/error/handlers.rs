//! Error handlers
//!
//! Classifies terminal errors and reports them once at the facade boundary.

use log::{error, warn};

use crate::error::types::FtpError;
use crate::transfer::TransferStatus;

/// Log a transfer failure for the given operation
pub fn handle_error(operation: &str, err: &FtpError) {
    match err {
        FtpError::Cancelled => warn!("{operation} cancelled"),
        FtpError::Command { code, message } => {
            error!("{operation} rejected by server: {code} {message}")
        }
        _ => error!("{operation} failed: {err}"),
    }
}

/// Convert an error to the terminal status of the operation it ended
pub fn error_to_status(err: &FtpError) -> TransferStatus {
    if err.is_cancelled() {
        TransferStatus::Cancelled
    } else {
        TransferStatus::Failed
    }
}
