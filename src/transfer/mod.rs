//! Transfer module for FTP client
//!
//! Passive data channel negotiation, the per-transfer engine and the
//! types describing a transfer and its outcome.

pub mod data_channel;
pub mod engine;
pub(crate) mod file_ops;
pub mod modes;
pub mod progress;
pub mod results;

// Re-export key types and functions
pub use data_channel::{open_data_connection, request_passive};
pub use engine::TransferEngine;
pub use modes::TransferType;
pub use progress::ProgressCallback;
pub use results::{Direction, TransferRequest, TransferResult, TransferState, TransferStatus};
