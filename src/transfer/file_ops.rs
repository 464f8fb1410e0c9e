//! Module `file_ops`
//!
//! Chunked copy loops between a local file and the data connection, with
//! cooperative cancellation and progress reporting between chunks.

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{FtpError, Result};
use crate::transfer::modes::{AsciiDecoder, AsciiEncoder, TransferType};
use crate::transfer::progress::ProgressReporter;

/// How a copy loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Streamed {
    /// Local-file bytes read (upload) or written (download)
    pub bytes: u64,
    pub cancelled: bool,
}

/// Settings shared by both copy directions
pub(crate) struct ChunkPump<'a> {
    pub chunk_size: usize,
    pub transfer_type: TransferType,
    pub cancel: &'a CancellationToken,
    pub progress: &'a mut ProgressReporter,
}

fn data_channel_error(action: &str, total: u64, e: std::io::Error) -> FtpError {
    FtpError::Transfer(format!("data connection failed {action} after {total} bytes: {e}"))
}

/// Streams a local file into the data connection until EOF.
pub(crate) async fn send_file<R, W>(source: &mut R, data: &mut W, pump: ChunkPump<'_>) -> Result<Streamed>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; pump.chunk_size];
    let mut encoded = Vec::new();
    let mut encoder = (pump.transfer_type == TransferType::Ascii).then(AsciiEncoder::default);
    let mut total = 0u64;

    loop {
        if pump.cancel.is_cancelled() {
            info!("Upload cancelled after {total} bytes");
            return Ok(Streamed {
                bytes: total,
                cancelled: true,
            });
        }

        let n = source.read(&mut buffer).await?;
        if n == 0 {
            break; // EOF
        }

        let wire = match encoder.as_mut() {
            Some(encoder) => {
                encoder.encode(&buffer[..n], &mut encoded);
                &encoded[..]
            }
            None => &buffer[..n],
        };
        data.write_all(wire)
            .await
            .map_err(|e| data_channel_error("sending", total, e))?;

        total += n as u64;
        pump.progress.report(total);
    }

    data.flush()
        .await
        .map_err(|e| data_channel_error("flushing", total, e))?;

    debug!("Sent {total} bytes");
    Ok(Streamed {
        bytes: total,
        cancelled: false,
    })
}

/// Streams the data connection into a local file until the server closes it.
pub(crate) async fn receive_file<R, W>(data: &mut R, sink: &mut W, pump: ChunkPump<'_>) -> Result<Streamed>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; pump.chunk_size];
    let mut decoded = Vec::new();
    let mut decoder = (pump.transfer_type == TransferType::Ascii).then(AsciiDecoder::default);
    let mut total = 0u64;

    loop {
        if pump.cancel.is_cancelled() {
            // keep what was received so far on disk
            sink.flush().await?;
            info!("Download cancelled after {total} bytes");
            return Ok(Streamed {
                bytes: total,
                cancelled: true,
            });
        }

        let n = data
            .read(&mut buffer)
            .await
            .map_err(|e| data_channel_error("receiving", total, e))?;
        if n == 0 {
            break; // server closed the data connection
        }

        let local = match decoder.as_mut() {
            Some(decoder) => {
                decoder.decode(&buffer[..n], &mut decoded);
                &decoded[..]
            }
            None => &buffer[..n],
        };
        if local.is_empty() {
            continue;
        }
        sink.write_all(local).await?;

        total += local.len() as u64;
        pump.progress.report(total);
    }

    if let Some(decoder) = decoder.as_mut() {
        decoder.finish(&mut decoded);
        if !decoded.is_empty() {
            sink.write_all(&decoded).await?;
            total += decoded.len() as u64;
            pump.progress.report(total);
        }
    }
    sink.flush().await?;

    debug!("Received {total} bytes");
    Ok(Streamed {
        bytes: total,
        cancelled: false,
    })
}
