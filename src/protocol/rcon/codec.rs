//! RCON packet framing.
//!
//! Wire layout (little endian):
//! `length: i32 | request_id: i32 | type: i32 | body | 0x00 | 0x00`,
//! where `length` counts everything after itself.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::common::error::RconError;

/// RCON packet types.
pub mod packet_type {
    /// Server -> Client: command output.
    pub const RESPONSE_VALUE: i32 = 0;
    /// Client -> Server: run a command.
    pub const EXEC_COMMAND: i32 = 2;
    /// Server -> Client: login result (shares the value of EXEC_COMMAND).
    pub const AUTH_RESPONSE: i32 = 2;
    /// Client -> Server: login with password.
    pub const AUTH: i32 = 3;
}

/// Request id the server uses to signal a rejected login.
pub const AUTH_FAILED_ID: i32 = -1;

/// Size of id + type + the two trailing nulls.
const HEADER_AND_PADDING: usize = 10;

/// Largest body a server sends in one packet: 4096 UTF-16 units, each at
/// most 3 bytes in UTF-8.
const MAX_BODY_LEN: usize = 4096 * 3;

/// An RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl RconPacket {
    /// Create a new packet.
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Encoded size in bytes, including the length prefix.
    pub fn encoded_len(&self) -> usize {
        4 + HEADER_AND_PADDING + self.body.len()
    }
}

/// Length-prefixed RCON codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct RconCodec;

impl Decoder for RconCodec {
    type Item = RconPacket;
    type Error = RconError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let length = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let length = usize::try_from(length).map_err(|_| RconError::InvalidPacket {
            message: format!("negative length {}", length),
        })?;
        if !(HEADER_AND_PADDING..=HEADER_AND_PADDING + MAX_BODY_LEN).contains(&length) {
            return Err(RconError::InvalidPacket {
                message: format!("length {} out of range", length),
            });
        }

        if src.len() < 4 + length {
            src.reserve(4 + length - src.len());
            return Ok(None);
        }

        src.advance(4);
        let id = src.get_i32_le();
        let kind = src.get_i32_le();
        let body = src.split_to(length - HEADER_AND_PADDING);
        src.advance(2);

        Ok(Some(RconPacket {
            id,
            kind,
            body: String::from_utf8_lossy(&body).into_owned(),
        }))
    }
}

impl Encoder<RconPacket> for RconCodec {
    type Error = RconError;

    fn encode(&mut self, packet: RconPacket, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let length = HEADER_AND_PADDING + packet.body.len();
        let length = i32::try_from(length).map_err(|_| RconError::InvalidPacket {
            message: format!("body of {} bytes is too large", packet.body.len()),
        })?;

        dst.reserve(packet.encoded_len());
        dst.put_i32_le(length);
        dst.put_i32_le(packet.id);
        dst.put_i32_le(packet.kind);
        dst.put_slice(packet.body.as_bytes());
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }
}

/// Encode a packet into a standalone buffer.
#[cfg(test)]
pub(crate) fn encode_packet(packet: RconPacket) -> Result<BytesMut, RconError> {
    let mut buf = BytesMut::new();
    RconCodec.encode(packet, &mut buf)?;
    Ok(buf)
}
