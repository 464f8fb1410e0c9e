//! Authentication
//!
//! Credentials used to log in on the control connection.

pub mod credentials;

pub use credentials::Credentials;
