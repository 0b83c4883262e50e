//! Transport and connector traits.
//!
//! The [`Transport`] trait abstracts over the physical link to a radio. The
//! CI-V codec in `civctl-icom` only ever writes whole frames and reads one
//! byte at a time, so those are the two operations every implementation must
//! provide efficiently. [`Connector`] produces fresh transports for drivers
//! that open the link once per operation.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to a radio.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. CI-V addressing and framing live in the protocol crate.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the radio.
    ///
    /// Returns once all bytes have been handed to the underlying link.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive up to `buf.len()` bytes, waiting at most `timeout`.
    ///
    /// Returns the number of bytes read. `Ok(0)` means end of stream.
    /// Returns [`Error::Timeout`] if nothing arrived before the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Read exactly one byte, waiting at most `timeout`.
    ///
    /// End of stream is reported as [`Error::Timeout`], the same as silence.
    async fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        let mut byte = [0u8; 1];
        match self.receive(&mut byte, timeout).await? {
            0 => Err(Error::Timeout),
            _ => Ok(byte[0]),
        }
    }

    /// Close the transport.
    ///
    /// After `close()`, `send()` and `receive()` return
    /// [`Error::NotConnected`]. Closing twice is not an error.
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently open.
    fn is_connected(&self) -> bool;
}

/// Opens a new [`Transport`] on demand.
///
/// Used by drivers that acquire the link for one request/response cycle and
/// release it afterwards.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a fresh transport to the radio.
    async fn connect(&self) -> Result<Box<dyn Transport>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-memory transport that hands out a fixed byte sequence.
    struct FixedBytes {
        data: Vec<u8>,
        pos: usize,
    }

    #[async_trait]
    impl Transport for FixedBytes {
        async fn send(&mut self, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn read_byte_yields_one_byte_at_a_time() {
        let mut t = FixedBytes {
            data: vec![0xFE, 0xFD],
            pos: 0,
        };
        let timeout = Duration::from_millis(10);
        assert_eq!(t.read_byte(timeout).await.unwrap(), 0xFE);
        assert_eq!(t.read_byte(timeout).await.unwrap(), 0xFD);
    }

    #[tokio::test]
    async fn read_byte_end_of_stream_is_timeout() {
        let mut t = FixedBytes {
            data: vec![],
            pos: 0,
        };
        let result = t.read_byte(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }
}
