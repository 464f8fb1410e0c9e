//! Utility functions
//!
//! Provides logging setup and local file validation.

pub mod logging;
pub mod validation;
