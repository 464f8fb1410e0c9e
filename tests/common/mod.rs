//! Scripted in-process FTP server for integration tests.
//!
//! Speaks just enough of the protocol for one put/get per session: a
//! multi-line greeting, USER/PASS, TYPE, PASV, STOR, RETR and QUIT. Files
//! live in memory and every command line received is recorded.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// What the server does right after accepting a control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Ready,
    /// Never says anything
    Silent,
    /// Closes the connection without a greeting
    HangUp,
}

/// How the server misbehaves, if at all
#[derive(Debug, Clone)]
pub struct Behaviour {
    pub greeting: Greeting,
    pub reject_login: bool,
    /// Reply sent to STOR instead of accepting the upload
    pub stor_reply: Option<&'static str>,
    /// Reply sent after the upload data has been received
    pub stor_final_reply: Option<&'static str>,
    /// Advertise `0,0,0,0` in the PASV reply
    pub advertise_unspecified: bool,
    pub retr_chunk: usize,
    pub retr_delay: Duration,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            greeting: Greeting::Ready,
            reject_login: false,
            stor_reply: None,
            stor_final_reply: None,
            advertise_unspecified: false,
            retr_chunk: 16 * 1024,
            retr_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    files: HashMap<String, Vec<u8>>,
    commands: Vec<String>,
    sessions_opened: usize,
    sessions_closed: usize,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub async fn start() -> MockServer {
        Self::with_behaviour(Behaviour::default()).await
    }

    pub async fn with_behaviour(behaviour: Behaviour) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let state = Arc::clone(&shared);
                let behaviour = behaviour.clone();
                tokio::spawn(async move {
                    state.lock().unwrap().sessions_opened += 1;
                    let _ = serve_session(socket, &behaviour, &state).await;
                    state.lock().unwrap().sessions_closed += 1;
                });
            }
        });

        MockServer { addr, state }
    }

    /// `ftp://` URL for `path` on this server, with optional userinfo
    pub fn url(&self, userinfo: &str, path: &str) -> String {
        format!("ftp://{userinfo}127.0.0.1:{}{path}", self.addr.port())
    }

    pub fn put_file(&self, path: &str, contents: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), contents);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().sessions_opened
    }

    /// Waits until `count` control connections have been closed by the client.
    pub async fn wait_for_closed_sessions(&self, count: usize) -> bool {
        for _ in 0..100 {
            if self.state.lock().unwrap().sessions_closed >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

async fn reply<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

async fn serve_session(
    socket: TcpStream,
    behaviour: &Behaviour,
    state: &Mutex<ServerState>,
) -> std::io::Result<()> {
    match behaviour.greeting {
        Greeting::Ready => {}
        Greeting::Silent => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return Ok(());
        }
        Greeting::HangUp => return Ok(()),
    }

    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut passive: Option<TcpListener> = None;

    reply(&mut writer, "220-Welcome to the mock FTP service.").await?;
    reply(&mut writer, "220 Ready.").await?;

    while let Some(line) = lines.next_line().await? {
        state.lock().unwrap().commands.push(line.clone());
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        match verb.as_str() {
            "USER" => reply(&mut writer, "331 Please specify the password.").await?,
            "PASS" if behaviour.reject_login => {
                reply(&mut writer, "530 Login incorrect.").await?
            }
            "PASS" => reply(&mut writer, "230 Login successful.").await?,
            "TYPE" => reply(&mut writer, "200 Switching mode.").await?,
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                let host = if behaviour.advertise_unspecified {
                    "0,0,0,0"
                } else {
                    "127,0,0,1"
                };
                passive = Some(listener);
                let message = format!(
                    "227 Entering Passive Mode ({host},{},{}).",
                    port >> 8,
                    port & 0xff
                );
                reply(&mut writer, &message).await?;
            }
            "STOR" => {
                let Some(listener) = passive.take() else {
                    reply(&mut writer, "425 Use PASV first.").await?;
                    continue;
                };
                if let Some(rejection) = behaviour.stor_reply {
                    reply(&mut writer, rejection).await?;
                    continue;
                }
                reply(&mut writer, "150 Ok to send data.").await?;
                let (mut data, _) = listener.accept().await?;
                let mut contents = Vec::new();
                data.read_to_end(&mut contents).await?;
                if let Some(final_reply) = behaviour.stor_final_reply {
                    reply(&mut writer, final_reply).await?;
                    continue;
                }
                state.lock().unwrap().files.insert(arg, contents);
                reply(&mut writer, "226 Transfer complete.").await?;
            }
            "RETR" => {
                let Some(listener) = passive.take() else {
                    reply(&mut writer, "425 Use PASV first.").await?;
                    continue;
                };
                let contents = state.lock().unwrap().files.get(&arg).cloned();
                let Some(contents) = contents else {
                    reply(&mut writer, "550 Failed to open file.").await?;
                    continue;
                };
                reply(&mut writer, "150 Opening BINARY mode data connection.").await?;
                let (mut data, _) = listener.accept().await?;
                let mut aborted = false;
                for chunk in contents.chunks(behaviour.retr_chunk.max(1)) {
                    if data.write_all(chunk).await.is_err() {
                        aborted = true;
                        break;
                    }
                    if !behaviour.retr_delay.is_zero() {
                        tokio::time::sleep(behaviour.retr_delay).await;
                    }
                }
                drop(data);
                if aborted {
                    reply(&mut writer, "426 Connection closed; transfer aborted.").await?;
                } else {
                    reply(&mut writer, "226 Transfer complete.").await?;
                }
            }
            "QUIT" => {
                reply(&mut writer, "221 Goodbye.").await?;
                break;
            }
            _ => reply(&mut writer, "502 Command not implemented.").await?,
        }
    }
    Ok(())
}
