//! FTP Protocol implementation
//!
//! Handles command rendering, reply parsing and reply classification.

pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::Command;
pub use parser::parse_pasv_reply;
pub use responses::{ReplyClass, Response};
