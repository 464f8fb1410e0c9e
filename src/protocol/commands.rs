//! Module `commands`
//!
//! Defines the FTP commands this client issues and renders them to the
//! CRLF-terminated lines written on the control connection.

use std::fmt;

use crate::transfer::TransferType;

/// Represents an FTP command sent by the client.
///
/// Commands that carry an argument store it as a `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    USER(String), // Username for login
    PASS(String), // Password for login
    TYPE(TransferType),
    PASV,
    STOR(String), // Store/upload file
    RETR(String), // Retrieve/download file
    QUIT,
}

impl Command {
    /// The command verb, also used to name the stage in timeout errors.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::USER(_) => "USER",
            Command::PASS(_) => "PASS",
            Command::TYPE(_) => "TYPE",
            Command::PASV => "PASV",
            Command::STOR(_) => "STOR",
            Command::RETR(_) => "RETR",
            Command::QUIT => "QUIT",
        }
    }

    /// Renders the command as it is sent on the wire.
    pub fn to_line(&self) -> String {
        match self {
            Command::USER(arg) | Command::PASS(arg) | Command::STOR(arg) | Command::RETR(arg) => {
                format!("{} {arg}\r\n", self.verb())
            }
            Command::TYPE(transfer_type) => format!("TYPE {}\r\n", transfer_type.code()),
            Command::PASV | Command::QUIT => format!("{}\r\n", self.verb()),
        }
    }
}

/// Log-safe rendering: the password never appears in output.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(_) => write!(f, "PASS ****"),
            other => write!(f, "{}", other.to_line().trim_end()),
        }
    }
}
