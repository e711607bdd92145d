//! Minecraft remote console (RCON) client.
//!
//! The relay talks to RCON through the [`RconConnector`] and [`RconSession`]
//! traits so tests can substitute fakes for the TCP client.

pub mod client;
pub mod codec;

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::common::error::{RconError, RconResult};
pub use client::RconClient;

/// An open RCON connection.
#[async_trait]
pub trait RconSession: Send {
    async fn authenticate(&mut self, password: &str) -> RconResult<()>;
    async fn command(&mut self, command: &str) -> RconResult<String>;
    async fn close(&mut self) -> RconResult<()>;
}

/// Opens a fresh RCON connection per call. No pooling.
#[async_trait]
pub trait RconConnector: Send + Sync {
    async fn connect(&self) -> RconResult<Box<dyn RconSession>>;
}

#[async_trait]
impl<S> RconSession for RconClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn authenticate(&mut self, password: &str) -> RconResult<()> {
        RconClient::authenticate(self, password).await
    }

    async fn command(&mut self, command: &str) -> RconResult<String> {
        RconClient::command(self, command).await
    }

    async fn close(&mut self) -> RconResult<()> {
        RconClient::close(self).await
    }
}

/// Connects to a Minecraft server over TCP.
#[derive(Debug, Clone)]
pub struct TcpRconConnector {
    host: String,
    port: u16,
}

impl TcpRconConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl RconConnector for TcpRconConnector {
    async fn connect(&self) -> RconResult<Box<dyn RconSession>> {
        let client = RconClient::connect(&self.host, self.port).await?;
        Ok(Box::new(client))
    }
}

/// Connect, authenticate, run one command and close.
///
/// The session is closed exactly once on every path after a successful
/// connect, including authentication and command failures. Connect and the
/// authenticate/command exchange are each bounded by `timeout`.
pub async fn run_command(
    connector: &dyn RconConnector,
    password: &str,
    command: &str,
    timeout: Duration,
) -> RconResult<String> {
    let timed_out = || RconError::Timeout {
        secs: timeout.as_secs(),
    };

    let mut session = tokio::time::timeout(timeout, connector.connect())
        .await
        .map_err(|_| timed_out())??;

    let outcome = tokio::time::timeout(timeout, exchange(session.as_mut(), password, command))
        .await
        .unwrap_or_else(|_| Err(timed_out()));

    match tokio::time::timeout(timeout, session.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to close RCON session: {}", e),
        Err(_) => warn!("Closing RCON session timed out, dropping it"),
    }

    outcome
}

async fn exchange(
    session: &mut dyn RconSession,
    password: &str,
    command: &str,
) -> RconResult<String> {
    session.authenticate(password).await?;
    debug!("RCON -> {}", command);
    session.command(command).await
}
