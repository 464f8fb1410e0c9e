//! RAX FTP Client
//!
//! An embeddable FTP client core: `put` and `get` single files over a control
//! connection plus a passive-mode data connection, with cancellation,
//! progress reporting and classified errors.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod utils;

pub use auth::Credentials;
pub use client::{FtpClient, FtpUrl, ServerEndpoint, TransferHandle, TransferOptions};
pub use config::ClientConfig;
pub use error::{ConnectError, FtpError};
pub use transfer::{
    Direction, ProgressCallback, TransferResult, TransferState, TransferStatus, TransferType,
};

pub use tokio_util::sync::CancellationToken;
