//! CI-V frame encoder and stream reader.
//!
//! The Icom CI-V (Communication Interface V) protocol uses binary frames on
//! a half-duplex bus. This module builds outbound frames and pulls one
//! inbound frame at a time off a [`Transport`].
//!
//! # Frame format
//!
//! ```text
//! 0xFE 0xFE <dst> <src> <cmd> [<sub>] [<data>...] 0xFD
//! ```
//!
//! - Preamble: two `0xFE` bytes
//! - `dst`: target CI-V address (e.g. `0x94` for IC-7300)
//! - `src`: sender address (typically `0xE0` for a PC controller)
//! - `cmd`: command byte
//! - `sub`: optional sub-command byte
//! - `data`: variable-length payload (BCD-encoded for numeric fields)
//! - Terminator: `0xFD`
//!
//! Payload bytes are not escaped. A `0xFE` or `0xFD` inside the payload
//! breaks framing; none of the commands in [`commands`](crate::commands)
//! ever produce one.

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::time::Instant;
use tracing::trace;

use civctl_core::error::{Error, Result};
use civctl_core::transport::Transport;

/// Preamble byte repeated twice at the start of every CI-V frame.
pub const PREAMBLE: u8 = 0xFE;

/// Frame terminator byte.
pub const TERMINATOR: u8 = 0xFD;

/// ACK command byte -- positive acknowledgement from the radio.
pub const ACK: u8 = 0xFB;

/// NAK command byte -- negative acknowledgement from the radio.
pub const NAK: u8 = 0xFA;

/// Encode a CI-V frame into raw bytes ready for transmission.
///
/// # Example
///
/// ```
/// use civctl_icom::civ::encode_frame;
///
/// // Read-frequency command to IC-7300 (addr 0x94)
/// let bytes = encode_frame(0x94, 0xE0, 0x03, None, &[]);
/// assert_eq!(bytes, vec![0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD]);
/// ```
pub fn encode_frame(
    dst_addr: u8,
    src_addr: u8,
    cmd: u8,
    sub_cmd: Option<u8>,
    data: &[u8],
) -> Vec<u8> {
    let capacity = 4 + 1 + sub_cmd.is_some() as usize + data.len() + 1;
    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_u8(PREAMBLE);
    buf.put_u8(PREAMBLE);
    buf.put_u8(dst_addr);
    buf.put_u8(src_addr);
    buf.put_u8(cmd);
    if let Some(sub) = sub_cmd {
        buf.put_u8(sub);
    }
    buf.put_slice(data);
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// The body of one received frame, between the preamble and the terminator.
///
/// The address and command envelope is still at the front:
/// `<dst> <src> <cmd> [<sub>...] <data...>`. Field decoders anchor at the
/// tail, since the value-bearing bytes are always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    bytes: Vec<u8>,
}

impl Response {
    /// Wrap the bytes of a frame body.
    pub fn new(bytes: Vec<u8>) -> Self {
        Response { bytes }
    }

    /// The raw frame body.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of body bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the frame had nothing between preamble and terminator.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The last `n` bytes of the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the body is shorter than `n`.
    pub fn tail(&self, n: usize) -> Result<&[u8]> {
        if self.bytes.len() < n {
            return Err(Error::Protocol(format!(
                "response too short: need {n} trailing bytes, got {:02X?}",
                self.bytes
            )));
        }
        Ok(&self.bytes[self.bytes.len() - n..])
    }

    /// The command byte, if the body is long enough to carry one.
    pub fn command(&self) -> Option<u8> {
        self.bytes.get(2).copied()
    }

    /// Returns `true` if this is a bare ACK (`<dst> <src> 0xFB`).
    pub fn is_ack(&self) -> bool {
        self.bytes.len() == 3 && self.bytes[2] == ACK
    }

    /// Returns `true` if this is a bare NAK (`<dst> <src> 0xFA`).
    pub fn is_nak(&self) -> bool {
        self.bytes.len() == 3 && self.bytes[2] == NAK
    }

    /// Returns `true` if this body is a copy of `request`, i.e. the bus (or
    /// the radio's USB echo setting) handed our own frame back.
    ///
    /// `request` is the complete encoded frame as sent, preamble and
    /// terminator included. Matching on the whole body keeps replies apart
    /// from echoes even when the radio and controller addresses are equal.
    pub fn is_echo_of(&self, request: &[u8]) -> bool {
        request.len() > 3
            && request[..2] == [PREAMBLE, PREAMBLE]
            && request[request.len() - 1] == TERMINATOR
            && self.bytes == request[2..request.len() - 1]
    }
}

/// Time left until `deadline`, or [`Error::Timeout`] if it has passed.
fn remaining(deadline: Instant) -> Result<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or(Error::Timeout)
}

/// Read one CI-V frame from `transport`.
///
/// Bytes before the first preamble byte are discarded. The preamble must be
/// doubled; the terminator is consumed but not returned. The whole frame has
/// to arrive within `timeout`, measured from the call.
///
/// # Errors
///
/// - [`Error::Timeout`] if no frame starts, or a started frame is not
///   terminated, before the window closes. No partial body is returned.
/// - [`Error::MalformedFrame`] if a `0xFE` is followed by anything other
///   than a second `0xFE`.
/// - Any transport error other than a timeout, unchanged.
pub async fn read_frame(transport: &mut dyn Transport, timeout: Duration) -> Result<Response> {
    let deadline = Instant::now() + timeout;

    loop {
        let byte = transport.read_byte(remaining(deadline)?).await?;
        if byte == PREAMBLE {
            break;
        }
        trace!("discarding byte 0x{byte:02X} before preamble");
    }

    let second = transport.read_byte(remaining(deadline)?).await?;
    if second != PREAMBLE {
        return Err(Error::MalformedFrame(format!(
            "preamble 0x{PREAMBLE:02X} followed by 0x{second:02X}"
        )));
    }

    let mut body = Vec::new();
    loop {
        let byte = transport.read_byte(remaining(deadline)?).await?;
        if byte == TERMINATOR {
            break;
        }
        body.push(byte);
    }

    trace!("received CI-V frame {body:02X?}");
    Ok(Response::new(body))
}
