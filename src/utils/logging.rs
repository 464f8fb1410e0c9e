//! Logging utilities
//!
//! Provides logging setup for the command-line binary. The library itself only
//! emits through the `log` facade and never installs a logger.

use env_logger::Env;

/// Setup logging; `RUST_LOG` wins over the verbosity flag when set
pub fn setup_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}
