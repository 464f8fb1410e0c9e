//! Module `control`
//!
//! The control connection: greeting, login, command/reply exchange and
//! orderly shutdown.

use std::net::IpAddr;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::auth::Credentials;
use crate::client::ServerEndpoint;
use crate::config::ClientConfig;
use crate::error::{ConnectError, FtpError, Result};
use crate::protocol::parser::{MultiLineParser, parse_reply_line};
use crate::protocol::responses::{
    ACCOUNT_REQUIRED, LOGIN_SUCCESS, PASSWORD_REQUIRED, SERVICE_READY,
};
use crate::protocol::{Command, Response};
use crate::session::SessionState;

/// `202 Command not implemented, superfluous at this site` is a valid answer to PASS
const COMMAND_SUPERFLUOUS: u16 = 202;

/// Textual command/response connection to an FTP server.
///
/// Generic over the byte stream so it can run over anything that reads and
/// writes; [`connect`](ControlChannel::connect) produces the TCP flavour.
pub struct ControlChannel<S = TcpStream> {
    stream: BufReader<S>,
    state: SessionState,
    peer: String,
    peer_ip: Option<IpAddr>,
    response_timeout: Duration,
    max_line_length: usize,
    max_response_lines: usize,
}

impl ControlChannel<TcpStream> {
    /// Opens a TCP connection to the endpoint and waits for a `220` greeting.
    pub async fn connect(endpoint: &ServerEndpoint, config: &ClientConfig) -> Result<Self> {
        let addr = endpoint.address();
        info!("Connecting to FTP server at {addr}");

        let connecting = TcpStream::connect((endpoint.host(), endpoint.port()));
        let stream = match timeout(config.connect_timeout(), connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ConnectError::Io { addr, source }.into()),
            Err(_) => return Err(ConnectError::TimedOut(addr).into()),
        };
        let peer_ip = stream.peer_addr().ok().map(|peer| peer.ip());

        let mut channel = Self::handshake(stream, addr, config).await?;
        channel.peer_ip = peer_ip;
        Ok(channel)
    }
}

impl<S> ControlChannel<S> {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Address of the server end of the control connection, when known.
    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.peer_ip
    }
}

impl<S> ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting on an already open stream.
    ///
    /// Anything but `220` (including `120`, "ready in nnn minutes") refuses
    /// the session.
    pub async fn handshake(stream: S, peer: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let mut channel = Self {
            stream: BufReader::new(stream),
            state: SessionState::Disconnected,
            peer: peer.into(),
            peer_ip: None,
            response_timeout: config.response_timeout(),
            max_line_length: config.max_line_length,
            max_response_lines: config.max_response_lines,
        };

        let greeting = match channel.read_response("greeting").await {
            Ok(greeting) => greeting,
            Err(e) => return Err(greeting_failure(&channel.peer, e)),
        };
        if greeting.code() != SERVICE_READY {
            warn!(
                "Server {} refused session: {} {}",
                channel.peer,
                greeting.code(),
                greeting.message()
            );
            return Err(ConnectError::Greeting {
                code: greeting.code(),
                message: greeting.message(),
            }
            .into());
        }

        channel.state = SessionState::Connected;
        debug!("Connected to {}: {}", channel.peer, greeting.message());
        Ok(channel)
    }

    /// Logs in with `USER`, then `PASS` if the server asks for a password.
    ///
    /// A permanent (5xx) rejection of either command is an authentication
    /// failure; transient (4xx) replies stay command errors.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Closed => return Err(FtpError::SessionClosed),
            other => {
                return Err(FtpError::Protocol(format!(
                    "cannot log in while {other}"
                )));
            }
        }

        let reply = self
            .send_command(&Command::USER(credentials.username().to_string()))
            .await
            .map_err(as_auth_rejection)?;

        let reply = match reply.code() {
            LOGIN_SUCCESS => reply,
            PASSWORD_REQUIRED => self
                .send_command(&Command::PASS(credentials.password().to_string()))
                .await
                .map_err(as_auth_rejection)?,
            _ => return Err(unexpected_login_reply("USER", &reply)),
        };

        match reply.code() {
            LOGIN_SUCCESS | COMMAND_SUPERFLUOUS => {}
            _ => return Err(unexpected_login_reply("PASS", &reply)),
        }

        self.state = SessionState::Authenticated;
        info!("Logged in to {} as {}", self.peer, credentials.username());
        Ok(())
    }

    /// Sends one command and reads its reply.
    ///
    /// 4xx/5xx replies are returned as [`FtpError::Command`].
    pub async fn send_command(&mut self, command: &Command) -> Result<Response> {
        let response = self.execute(command).await?;
        if response.is_negative() {
            return Err(FtpError::Command {
                code: response.code(),
                message: response.message(),
            });
        }
        Ok(response)
    }

    /// Sends one command and returns whatever reply comes back.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Response> {
        self.write_command(command).await?;
        self.read_response(command.verb()).await
    }

    async fn write_command(&mut self, command: &Command) -> Result<()> {
        if !self.state.is_open() {
            return Err(FtpError::SessionClosed);
        }

        debug!("{} > {command}", self.peer);
        let line = command.to_line();
        let stream = self.stream.get_mut();
        let written = match stream.write_all(line.as_bytes()).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| self.connection_lost(e))
    }

    /// Reads one logical reply, bounded by the response timeout.
    pub(crate) async fn read_response(&mut self, stage: &'static str) -> Result<Response> {
        if self.state == SessionState::Closed {
            return Err(FtpError::SessionClosed);
        }

        let reply = timeout(self.response_timeout, self.read_reply()).await;
        match reply {
            Ok(reply) => reply,
            Err(_) => {
                warn!(
                    "No reply from {} for {stage} within {:?}",
                    self.peer, self.response_timeout
                );
                Err(FtpError::Timeout(stage))
            }
        }
    }

    async fn read_reply(&mut self) -> Result<Response> {
        let mut buf = Vec::with_capacity(128);

        let first = self.read_line(&mut buf).await?;
        let line = parse_reply_line(&first)?;

        let response = if line.continued {
            let mut parser = MultiLineParser::new(&line, self.max_response_lines);
            loop {
                let next = self.read_line(&mut buf).await?;
                if parser.feed_line(&next)? {
                    break parser.finish();
                }
            }
        } else {
            Response::new(line.code, vec![line.text.to_string()])
        };

        debug!("{} < {} {}", self.peer, response.code(), response.message());
        Ok(response)
    }

    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<String> {
        buf.clear();

        let limit = self.max_line_length as u64;
        let read = (&mut self.stream).take(limit).read_until(b'\n', buf).await;
        let len = read.map_err(|e| self.connection_lost(e))?;

        if len == 0 {
            return Err(FtpError::Protocol(format!(
                "control connection closed by {}",
                self.peer
            )));
        }
        if buf.last() != Some(&b'\n') {
            if len as u64 >= limit {
                return Err(FtpError::Protocol(format!(
                    "reply line exceeds {} bytes",
                    self.max_line_length
                )));
            }
            return Err(FtpError::Protocol(format!(
                "control connection closed by {} mid-reply",
                self.peer
            )));
        }

        let line = String::from_utf8_lossy(buf);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Sends `QUIT` without waiting for the answer and shuts the socket down.
    ///
    /// Safe to call more than once; every later command fails with
    /// [`FtpError::SessionClosed`].
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let send_quit = self.state.is_open();
        self.state = SessionState::Closed;

        let peer = &self.peer;
        let stream = self.stream.get_mut();
        if send_quit {
            debug!("{peer} > {}", Command::QUIT);
        }
        let shutdown = async {
            if send_quit {
                stream.write_all(Command::QUIT.to_line().as_bytes()).await?;
                stream.flush().await?;
            }
            stream.shutdown().await
        };
        match timeout(self.response_timeout, shutdown).await {
            Ok(Ok(())) => debug!("Control connection to {peer} closed"),
            Ok(Err(e)) => debug!("Control connection to {peer} closed uncleanly: {e}"),
            Err(_) => debug!("Control connection to {peer} timed out while closing"),
        }
    }

    fn connection_lost(&self, source: std::io::Error) -> FtpError {
        ConnectError::Io {
            addr: self.peer.clone(),
            source,
        }
        .into()
    }
}

/// Any failure before a greeting arrives means the session was never established.
fn greeting_failure(peer: &str, err: FtpError) -> FtpError {
    let failure = match err {
        FtpError::Connect(failure) => failure,
        FtpError::Timeout(_) => ConnectError::TimedOut(peer.to_string()),
        other => ConnectError::NoGreeting {
            addr: peer.to_string(),
            reason: other.to_string(),
        },
    };
    warn!("No usable greeting from {peer}: {failure}");
    failure.into()
}

/// 5xx replies to USER/PASS mean the credentials were refused.
fn as_auth_rejection(err: FtpError) -> FtpError {
    match err {
        FtpError::Command { code, message } if code >= 500 => FtpError::Auth { code, message },
        other => other,
    }
}

fn unexpected_login_reply(verb: &str, reply: &Response) -> FtpError {
    if reply.code() == ACCOUNT_REQUIRED {
        return FtpError::Auth {
            code: reply.code(),
            message: format!("account required, not supported: {}", reply.message()),
        };
    }
    FtpError::Protocol(format!(
        "unexpected reply to {verb}: {} {}",
        reply.code(),
        reply.message()
    ))
}
