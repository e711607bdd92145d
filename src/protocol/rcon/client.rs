//! RCON client session.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use crate::common::error::{RconError, RconResult};
use crate::protocol::rcon::codec::{packet_type, RconCodec, RconPacket, AUTH_FAILED_ID};

/// Longest command body a Minecraft server accepts.
pub const MAX_COMMAND_LEN: usize = 1446;

/// One RCON connection.
pub struct RconClient<S> {
    framed: Framed<S, RconCodec>,
    next_id: i32,
    closed: bool,
}

impl RconClient<TcpStream> {
    /// Open a TCP connection to the server's RCON port.
    pub async fn connect(host: &str, port: u16) -> RconResult<Self> {
        debug!("Connecting to RCON at {}:{}", host, port);

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| RconError::ConnectFailed {
                host: host.to_string(),
                port,
                source: e,
            })?;

        Ok(Self::new(stream))
    }
}

impl<S> RconClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, RconCodec),
            next_id: 1,
            closed: false,
        }
    }

    /// Log in with the server password.
    pub async fn authenticate(&mut self, password: &str) -> RconResult<()> {
        let id = self.next_request_id();
        self.framed
            .send(RconPacket::new(id, packet_type::AUTH, password))
            .await?;

        loop {
            let packet = self.read_packet().await?;
            match packet.kind {
                // Some servers send an empty response value before the auth result
                packet_type::RESPONSE_VALUE => continue,
                packet_type::AUTH_RESPONSE if packet.id == AUTH_FAILED_ID => {
                    return Err(RconError::AuthFailed);
                }
                packet_type::AUTH_RESPONSE if packet.id == id => {
                    debug!("RCON authenticated");
                    return Ok(());
                }
                kind => {
                    return Err(RconError::InvalidPacket {
                        message: format!("unexpected auth reply id={} type={}", packet.id, kind),
                    });
                }
            }
        }
    }

    /// Run a console command and return its output.
    pub async fn command(&mut self, command: &str) -> RconResult<String> {
        if command.len() > MAX_COMMAND_LEN {
            return Err(RconError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_LEN,
            });
        }

        let id = self.next_request_id();
        self.framed
            .send(RconPacket::new(id, packet_type::EXEC_COMMAND, command))
            .await?;

        loop {
            let packet = self.read_packet().await?;
            if packet.id == AUTH_FAILED_ID {
                return Err(RconError::AuthFailed);
            }
            if packet.id == id && packet.kind == packet_type::RESPONSE_VALUE {
                info!("RCON <- {}", packet.body);
                return Ok(packet.body);
            }
            debug!("Skipping stale RCON packet id={}", packet.id);
        }
    }

    /// Flush and shut the connection down. Safe to call more than once.
    pub async fn close(&mut self) -> RconResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        SinkExt::<RconPacket>::close(&mut self.framed).await
    }

    async fn read_packet(&mut self) -> RconResult<RconPacket> {
        match self.framed.next().await {
            Some(packet) => packet,
            None => Err(RconError::ConnectionClosed),
        }
    }

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = match self.next_id.wrapping_add(1) {
            next if next > 0 => next,
            _ => 1,
        };
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::rcon::codec::encode_packet;
    use tokio_test::io::Builder;

    fn bytes(id: i32, kind: i32, body: &str) -> Vec<u8> {
        encode_packet(RconPacket::new(id, kind, body)).unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_authenticate_and_command() {
        let mut auth_reply = bytes(1, packet_type::RESPONSE_VALUE, "");
        auth_reply.extend(bytes(1, packet_type::AUTH_RESPONSE, ""));

        let mock = Builder::new()
            .write(&bytes(1, packet_type::AUTH, "secret"))
            .read(&auth_reply)
            .write(&bytes(2, packet_type::EXEC_COMMAND, "list"))
            .read(&bytes(2, packet_type::RESPONSE_VALUE, "There are 0 players online"))
            .build();

        let mut client = RconClient::new(mock);
        client.authenticate("secret").await.unwrap();
        let output = client.command("list").await.unwrap();
        assert_eq!(output, "There are 0 players online");
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let mock = Builder::new()
            .write(&bytes(1, packet_type::AUTH, "nope"))
            .read(&bytes(AUTH_FAILED_ID, packet_type::AUTH_RESPONSE, ""))
            .build();

        let mut client = RconClient::new(mock);
        let result = client.authenticate("nope").await;
        assert!(matches!(result, Err(RconError::AuthFailed)));
    }

    #[tokio::test]
    async fn test_connection_closed_while_waiting() {
        let mock = Builder::new()
            .write(&bytes(1, packet_type::AUTH, "secret"))
            .build();

        let mut client = RconClient::new(mock);
        let result = client.authenticate("secret").await;
        assert!(matches!(result, Err(RconError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_command_too_long_is_not_sent() {
        let mock = Builder::new().build();
        let mut client = RconClient::new(mock);

        let command = "a".repeat(MAX_COMMAND_LEN + 1);
        let result = client.command(&command).await;
        assert!(matches!(result, Err(RconError::CommandTooLong { .. })));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut client = RconClient::new(Builder::new().build());
        client.close().await.unwrap();
        client.close().await.unwrap();
    }
}
