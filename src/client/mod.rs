//! Client facade
//!
//! [`FtpClient`] is the entry point for hosts: `put` and `get` each spawn an
//! independent transfer with its own control session and return a
//! [`TransferHandle`].

pub mod endpoint;
pub mod handle;

pub use endpoint::{FtpUrl, ServerEndpoint};
pub use handle::TransferHandle;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::handlers::handle_error;
use crate::error::{FtpError, Result};
use crate::session::Session;
use crate::transfer::{
    Direction, ProgressCallback, TransferEngine, TransferRequest, TransferResult,
};
use crate::utils::validation::{check_destination, open_source};

/// Per-call options for `put`/`get`
#[derive(Clone, Default)]
pub struct TransferOptions {
    progress: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
}

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer called with the cumulative byte count as the transfer advances
    pub fn with_progress<F>(self, observer: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.with_progress_callback(Arc::new(observer))
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Use an existing token instead of a fresh one, so several transfers
    /// can be cancelled together.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Spawns FTP transfers. Cheap to clone; clones share the configuration.
#[derive(Debug, Clone)]
pub struct FtpClient {
    config: Arc<ClientConfig>,
}

impl FtpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Uploads `local_file` to the file named by `url`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn put(
        &self,
        local_file: impl Into<PathBuf>,
        url: &str,
        options: TransferOptions,
    ) -> TransferHandle {
        self.spawn(Direction::Upload, local_file.into(), url.to_string(), options)
    }

    /// Downloads the file named by `url` into `local_file`, replacing it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get(
        &self,
        local_file: impl Into<PathBuf>,
        url: &str,
        options: TransferOptions,
    ) -> TransferHandle {
        self.spawn(Direction::Download, local_file.into(), url.to_string(), options)
    }

    fn spawn(
        &self,
        direction: Direction,
        local_file: PathBuf,
        url: String,
        options: TransferOptions,
    ) -> TransferHandle {
        let cancel = options.cancel.unwrap_or_default();
        let config = Arc::clone(&self.config);
        let token = cancel.clone();
        let progress = options.progress;

        let task = tokio::spawn(async move {
            run_transfer(&config, direction, local_file, &url, token, progress).await
        });
        TransferHandle::new(task, cancel)
    }
}

async fn run_transfer(
    config: &ClientConfig,
    direction: Direction,
    local_file: PathBuf,
    url: &str,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<TransferResult> {
    let work = execute(config, direction, local_file, url, cancel, progress);

    let outcome = match config.transfer_deadline() {
        // Dropping the timed-out future closes the sockets it owns
        Some(deadline) => tokio::time::timeout(deadline, work)
            .await
            .unwrap_or_else(|_| Err(FtpError::Timeout("transfer deadline"))),
        None => work.await,
    };

    match &outcome {
        Ok(result) => debug!("{direction} finished with status {}", result.status),
        Err(e) => handle_error(&direction.to_string(), e),
    }
    outcome
}

async fn execute(
    config: &ClientConfig,
    direction: Direction,
    local_file: PathBuf,
    url: &str,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<TransferResult> {
    let started = Instant::now();
    let (endpoint, remote_path) = url.parse::<FtpUrl>()?.into_parts();
    let request = TransferRequest::new(local_file, remote_path, direction)
        .with_transfer_type(endpoint.transfer_type());

    // Local checks run before any connection is made
    let source = match direction {
        Direction::Upload => Some(open_source(request.local_path()).await?),
        Direction::Download => {
            check_destination(request.local_path()).await?;
            None
        }
    };

    if cancel.is_cancelled() {
        info!("{direction} of {} cancelled before connecting", request.remote_path());
        return Ok(TransferResult::cancelled(0, started.elapsed()));
    }

    info!(
        "Starting {direction}: {} <-> {}:{}{}",
        request.local_path().display(),
        endpoint.host(),
        endpoint.port(),
        request.remote_path()
    );

    let mut session = Session::open(&endpoint, config).await?;
    let mut engine = TransferEngine::new(config, cancel, progress);

    let outcome = match source {
        Some(file) => engine.upload(session.control_mut(), &request, file).await,
        None => engine.download(session.control_mut(), &request).await,
    };

    session.close().await;
    outcome
}
