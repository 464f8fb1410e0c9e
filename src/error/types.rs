//! Error types
//!
//! Defines the failure kinds a transfer can terminate with. Every public
//! operation of the client returns `Result<_, FtpError>`.

use std::io;

use thiserror::Error;

/// Failures while establishing the control or data connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connect to {addr} failed: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out connecting to {0}")]
    TimedOut(String),
    #[error("server refused the session: {code} {message}")]
    Greeting { code: u16, message: String },
    #[error("no greeting from {addr}: {reason}")]
    NoGreeting { addr: String, reason: String },
}

/// General FTP client error that encompasses all failure kinds
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("authentication rejected: {code} {message}")]
    Auth { code: u16, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("command failed: {code} {message}")]
    Command { code: u16, message: String },

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("transfer cancelled")]
    Cancelled,

    #[error("local I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid FTP URL: {0}")]
    InvalidUrl(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("control session is closed")]
    SessionClosed,
}

impl FtpError {
    /// Server reply code carried by this error, if the server produced one.
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            FtpError::Auth { code, .. } | FtpError::Command { code, .. } => Some(*code),
            FtpError::Connect(ConnectError::Greeting { code, .. }) => Some(*code),
            _ => None,
        }
    }

    /// Whether this error ended the transfer because the caller asked for it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FtpError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, FtpError>;
