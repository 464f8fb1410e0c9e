//! Session management
//!
//! A session is one authenticated control connection, opened for a single
//! transfer and closed when that transfer ends.

pub mod control;
pub mod state;

pub use control::ControlChannel;
pub use state::SessionState;

use crate::client::ServerEndpoint;
use crate::config::ClientConfig;
use crate::error::Result;

/// Owns the control connection of one transfer
pub struct Session {
    control: ControlChannel,
}

impl Session {
    /// Connects and logs in. If login fails the connection is closed before
    /// the error is returned.
    pub async fn open(endpoint: &ServerEndpoint, config: &ClientConfig) -> Result<Self> {
        let mut control = ControlChannel::connect(endpoint, config).await?;
        if let Err(e) = control.authenticate(endpoint.credentials()).await {
            control.close().await;
            return Err(e);
        }
        Ok(Self { control })
    }

    pub fn state(&self) -> SessionState {
        self.control.state()
    }

    pub fn control_mut(&mut self) -> &mut ControlChannel {
        &mut self.control
    }

    pub async fn close(&mut self) {
        self.control.close().await;
    }
}
