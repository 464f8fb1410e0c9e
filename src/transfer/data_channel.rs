//! Module `data_channel`
//!
//! Negotiates the passive-mode data connection for a transfer: asks the
//! server for a port with `PASV` and connects to it. Active mode (`PORT`)
//! is not supported, so the client never has to accept inbound connections.

use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{ConnectError, FtpError, Result};
use crate::protocol::responses::ENTERING_PASSIVE_MODE;
use crate::protocol::{Command, parse_pasv_reply};
use crate::session::ControlChannel;

/// Sends `PASV` and returns the address the server is listening on.
///
/// A server that advertises `0.0.0.0` is reached on the address of the
/// control connection instead.
pub async fn request_passive<S>(control: &mut ControlChannel<S>) -> Result<SocketAddr>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let response = control.send_command(&Command::PASV).await?;
    if response.code() != ENTERING_PASSIVE_MODE {
        return Err(FtpError::Protocol(format!(
            "unexpected reply to PASV: {} {}",
            response.code(),
            response.message()
        )));
    }

    let message = response.message();
    let advertised = parse_pasv_reply(&message)
        .ok_or_else(|| FtpError::Protocol(format!("cannot parse PASV reply: {message}")))?;

    let addr = resolve_advertised(advertised, control);
    debug!("Server opened passive data port at {addr}");
    Ok(addr)
}

fn resolve_advertised<S>(advertised: SocketAddrV4, control: &ControlChannel<S>) -> SocketAddr {
    match control.peer_ip() {
        Some(peer_ip) if advertised.ip().is_unspecified() => {
            SocketAddr::new(peer_ip, advertised.port())
        }
        _ => SocketAddr::V4(advertised),
    }
}

/// Connects to a passive data port. The caller owns the returned stream.
pub async fn open_data_connection(addr: SocketAddr, connect_timeout: Duration) -> Result<TcpStream> {
    let stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            return Err(ConnectError::Io {
                addr: addr.to_string(),
                source,
            }
            .into());
        }
        Err(_) => return Err(ConnectError::TimedOut(addr.to_string()).into()),
    };

    info!("Data connection established with {addr}");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::net::Ipv4Addr;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    async fn control_with_reply(
        pasv_reply: &'static str,
    ) -> (ControlChannel<DuplexStream>, JoinHandle<()>) {
        let (client, server) = duplex(4096);
        let server_task = tokio::spawn(async move {
            let mut server = BufReader::new(server);
            server.get_mut().write_all(b"220 Ready\r\n").await.unwrap();
            let mut line = String::new();
            server.read_line(&mut line).await.unwrap();
            assert_eq!(line, "PASV\r\n");
            server.get_mut().write_all(pasv_reply.as_bytes()).await.unwrap();
            // hold the stream open until the client is done
            let mut rest = String::new();
            let _ = server.read_line(&mut rest).await;
        });

        let config = ClientConfig {
            response_timeout_secs: 1,
            ..ClientConfig::default()
        };
        let control = ControlChannel::handshake(client, "test", &config).await.unwrap();
        (control, server_task)
    }

    #[tokio::test]
    async fn pasv_reply_gives_data_address() {
        let (mut control, _server) =
            control_with_reply("227 Entering Passive Mode (127,0,0,1,195,80)\r\n").await;

        let addr = request_passive(&mut control).await.unwrap();
        assert_eq!(addr, SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 50000));
    }

    #[tokio::test]
    async fn unparseable_pasv_reply_is_protocol_error() {
        let (mut control, _server) =
            control_with_reply("227 Entering Passive Mode (nonsense)\r\n").await;

        let result = request_passive(&mut control).await;
        assert!(matches!(result, Err(FtpError::Protocol(_))));
    }

    #[tokio::test]
    async fn refused_pasv_is_command_error() {
        let (mut control, _server) = control_with_reply("502 PASV not implemented\r\n").await;

        let result = request_passive(&mut control).await;
        assert!(matches!(result, Err(FtpError::Command { code: 502, .. })));
    }

    #[tokio::test]
    async fn data_connection_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = open_data_connection(addr, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(FtpError::Connect(_))));
    }
}
