//! Module `engine`
//!
//! Runs one upload or download over an authenticated control connection:
//! sets the transfer type, negotiates the passive data connection, issues
//! `STOR`/`RETR`, streams the bytes and checks the server's final reply.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{FtpError, Result};
use crate::protocol::Command;
use crate::session::ControlChannel;
use crate::transfer::data_channel::{open_data_connection, request_passive};
use crate::transfer::file_ops::{ChunkPump, Streamed, receive_file, send_file};
use crate::transfer::progress::{ProgressCallback, ProgressReporter};
use crate::transfer::{TransferRequest, TransferResult, TransferState};

/// Drives a single transfer through
/// `Init → Negotiating → Transferring → Finalizing → Done`.
///
/// Any error moves the engine to `Failed`; a cancellation observed between
/// chunks moves it to `Cancelled`. An engine is used for one transfer only.
pub struct TransferEngine {
    chunk_size: usize,
    connect_timeout: Duration,
    cancel: CancellationToken,
    progress: ProgressReporter,
    state: TransferState,
}

impl TransferEngine {
    pub fn new(config: &ClientConfig, cancel: CancellationToken, progress: Option<ProgressCallback>) -> Self {
        Self {
            chunk_size: config.chunk_size,
            connect_timeout: config.connect_timeout(),
            cancel,
            progress: ProgressReporter::new(progress),
            state: TransferState::Init,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Uploads `file` to the request's remote path with `STOR`.
    pub async fn upload<S>(
        &mut self,
        control: &mut ControlChannel<S>,
        request: &TransferRequest,
        mut file: File,
    ) -> Result<TransferResult>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let command = Command::STOR(request.remote_path().to_string());

        let outcome = async {
            let mut data = self.open_transfer(control, request, &command).await?;

            self.enter(TransferState::Transferring);
            let streamed = send_file(&mut file, &mut data, self.pump(request)).await?;
            if streamed.cancelled {
                return Ok(streamed);
            }

            // EOF on the data connection marks the end of the upload
            data.shutdown()
                .await
                .map_err(|e| FtpError::Transfer(format!("closing data connection: {e}")))?;
            drop(data);

            self.confirm(control, &command).await?;
            Ok::<_, FtpError>(streamed)
        }
        .await;

        self.progress.finish().await;
        self.finish(request, outcome, started)
    }

    /// Downloads the request's remote path with `RETR` into the local path.
    ///
    /// The destination is created (or truncated) once the server has
    /// accepted `RETR`. A cancelled download leaves the partial file behind.
    pub async fn download<S>(
        &mut self,
        control: &mut ControlChannel<S>,
        request: &TransferRequest,
    ) -> Result<TransferResult>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let command = Command::RETR(request.remote_path().to_string());

        let outcome = async {
            let mut data = self.open_transfer(control, request, &command).await?;
            let mut file = File::create(request.local_path()).await?;

            self.enter(TransferState::Transferring);
            let streamed = receive_file(&mut data, &mut file, self.pump(request)).await?;
            drop(data);
            if streamed.cancelled {
                return Ok(streamed);
            }

            self.confirm(control, &command).await?;
            Ok::<_, FtpError>(streamed)
        }
        .await;

        self.progress.finish().await;
        self.finish(request, outcome, started)
    }

    /// `TYPE`, `PASV`, data connection, then the transfer command itself.
    ///
    /// The data connection is opened before `STOR`/`RETR` is sent because
    /// many servers wait for it before sending their 1xx reply.
    async fn open_transfer<S>(
        &mut self,
        control: &mut ControlChannel<S>,
        request: &TransferRequest,
        command: &Command,
    ) -> Result<TcpStream>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.enter(TransferState::Negotiating);

        control
            .send_command(&Command::TYPE(request.transfer_type()))
            .await?;

        let addr = request_passive(control).await?;
        let data = open_data_connection(addr, self.connect_timeout).await?;

        let reply = control.send_command(command).await?;
        if !reply.is_preliminary() {
            return Err(FtpError::Protocol(format!(
                "expected preliminary reply to {}, got {} {}",
                command.verb(),
                reply.code(),
                reply.message()
            )));
        }
        debug!("Server accepted {command}: {} {}", reply.code(), reply.message());
        Ok(data)
    }

    /// Reads the reply that closes the transfer; only 2xx counts as success.
    ///
    /// A 4xx/5xx here (e.g. `552` storage exceeded) keeps its reply code.
    async fn confirm<S>(&mut self, control: &mut ControlChannel<S>, command: &Command) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.enter(TransferState::Finalizing);

        let reply = control.read_response(command.verb()).await?;
        if reply.is_negative() {
            return Err(FtpError::Command {
                code: reply.code(),
                message: reply.message(),
            });
        }
        if !reply.is_completion() {
            return Err(FtpError::Transfer(format!(
                "server did not confirm {}: {} {}",
                command.verb(),
                reply.code(),
                reply.message()
            )));
        }
        Ok(())
    }

    fn pump(&mut self, request: &TransferRequest) -> ChunkPump<'_> {
        ChunkPump {
            chunk_size: self.chunk_size,
            transfer_type: request.transfer_type(),
            cancel: &self.cancel,
            progress: &mut self.progress,
        }
    }

    fn finish(
        &mut self,
        request: &TransferRequest,
        outcome: Result<Streamed>,
        started: Instant,
    ) -> Result<TransferResult> {
        let elapsed = started.elapsed();
        match outcome {
            Ok(streamed) if streamed.cancelled => {
                self.enter(TransferState::Cancelled);
                warn!(
                    "{} of {} cancelled after {} bytes",
                    request.direction(),
                    request.remote_path(),
                    streamed.bytes
                );
                Ok(TransferResult::cancelled(streamed.bytes, elapsed))
            }
            Ok(streamed) => {
                self.enter(TransferState::Done);
                info!(
                    "{} of {} completed: {} bytes in {elapsed:?}",
                    request.direction(),
                    request.remote_path(),
                    streamed.bytes
                );
                Ok(TransferResult::success(streamed.bytes, elapsed))
            }
            Err(e) => {
                self.enter(TransferState::Failed);
                Err(e)
            }
        }
    }

    fn enter(&mut self, next: TransferState) {
        debug!("Transfer state {:?} -> {next:?}", self.state);
        self.state = next;
    }
}
