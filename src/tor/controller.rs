use crate::config::TorConfig;
use crate::tor::Rotate;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;

/// Errors from the Tor control channel
///
/// All of these are fatal to a harvest run: without working rotation the
/// retry strategy cannot recover from blocking.
#[derive(Debug, Error)]
pub enum TorError {
    #[error("Control port unreachable at {addr}: {source}")]
    Unreachable {
        addr: String,
        source: std::io::Error,
    },

    #[error("Control port authentication rejected: {reply}")]
    AuthRejected { reply: String },

    #[error("NEWNYM signal rejected: {reply}")]
    SignalRejected { reply: String },

    #[error("Control protocol error: {0}")]
    Protocol(String),

    #[error("Control connection IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the Tor control port
///
/// Speaks the minimal slice of the control protocol needed here: password
/// authentication, the NEWNYM signal, and a polite QUIT. Each rotation opens
/// a fresh connection; the control port is cheap to reconnect to and holding
/// a session across the long inter-request pauses buys nothing.
pub struct TorController {
    control_addr: String,
    password: String,
    cooldown: Duration,
}

impl TorController {
    pub fn new(config: &TorConfig) -> Self {
        Self {
            control_addr: config.control_addr.clone(),
            password: config.control_password.clone(),
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }

    /// Authenticates and sends SIGNAL NEWNYM, verifying the 250 replies.
    async fn signal_newnym(&self) -> Result<(), TorError> {
        let stream =
            TcpStream::connect(&self.control_addr)
                .await
                .map_err(|source| TorError::Unreachable {
                    addr: self.control_addr.clone(),
                    source,
                })?;

        let (read_half, mut write_half) = stream.into_split();
        let mut replies = BufReader::new(read_half).lines();

        let auth = format!("AUTHENTICATE \"{}\"\r\n", quote_escape(&self.password));
        write_half.write_all(auth.as_bytes()).await?;
        let reply = read_reply(&mut replies).await?;
        if !reply.starts_with("250") {
            return Err(TorError::AuthRejected { reply });
        }

        write_half.write_all(b"SIGNAL NEWNYM\r\n").await?;
        let reply = read_reply(&mut replies).await?;
        if !reply.starts_with("250") {
            return Err(TorError::SignalRejected { reply });
        }

        // The daemon drops the connection after QUIT; nothing left to check
        let _ = write_half.write_all(b"QUIT\r\n").await;

        Ok(())
    }
}

impl Rotate for TorController {
    async fn rotate(&self) -> Result<(), TorError> {
        self.signal_newnym().await?;
        tracing::info!(
            "Requested new Tor identity, cooling down {}s",
            self.cooldown.as_secs()
        );
        // Circuit rebuilding is asynchronous on the daemon side; reusing the
        // proxy before the cooldown elapses would ride the old circuit
        tokio::time::sleep(self.cooldown).await;
        Ok(())
    }
}

async fn read_reply(replies: &mut Lines<BufReader<OwnedReadHalf>>) -> Result<String, TorError> {
    match replies.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => Err(TorError::Protocol(
            "control connection closed before reply".to_string(),
        )),
    }
}

/// Escapes a password for the control protocol's quoted-string form.
fn quote_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
