//! Mock transport for deterministic testing of the CI-V codec.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. When the code under test sends the expected
//! request, the paired response bytes become readable.
//!
//! # Example
//!
//! ```
//! use civctl_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Read-frequency to an IC-7300, answered with 14.074 MHz.
//! mock.expect(&[0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD],
//!             &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x40, 0x07, 0x14, 0x00, 0xFD]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use civctl_core::error::{Error, Result};
use civctl_core::transport::{Connector, Transport};

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. A `send()` that does not match the
/// next expectation fails with [`Error::Protocol`]. Reads drain the bytes
/// made available so far and return [`Error::Timeout`] once they run out,
/// which is what a silent radio looks like.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// Bytes readable by the next `receive()` calls.
    incoming: VecDeque<u8>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    /// Shared counter bumped on `close()`, set by [`MockConnector`].
    close_counter: Option<Arc<AtomicUsize>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            incoming: VecDeque::new(),
            connected: true,
            sent_log: Vec::new(),
            close_counter: None,
        }
    }

    /// Add an expected request/response pair.
    ///
    /// An empty `response` models a radio that stays silent after the
    /// request (e.g. a fire-and-forget set command).
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Make bytes readable immediately, without a matching request.
    ///
    /// Useful for feeding the frame reader directly, or for simulating
    /// noise already sitting in the port's receive buffer.
    pub fn push_incoming(&mut self, data: &[u8]) {
        self.incoming.extend(data.iter().copied());
    }

    /// All data sent through this transport, one element per `send()`.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of bytes still waiting to be read.
    pub fn unread_len(&self) -> usize {
        self.incoming.len()
    }

    /// Set the connected state.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        let expectation = self
            .expectations
            .pop_front()
            .ok_or_else(|| Error::Protocol("no more expectations in mock transport".into()))?;
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            )));
        }
        self.incoming.extend(expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.incoming.is_empty() {
            return Err(Error::Timeout);
        }
        let n = self.incoming.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            if let Some(counter) = &self.close_counter {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.connected = false;
        self.incoming.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// A mock [`Connector`] that hands out pre-scripted transports in order.
///
/// Each `connect()` pops the next queued [`MockTransport`]. Once the queue
/// is empty, `connect()` fails with [`Error::Transport`], like a port that
/// cannot be opened. Every transport it hands out reports `close()` back to
/// the connector, so tests can assert that drivers release the link.
#[derive(Debug, Default)]
pub struct MockConnector {
    transports: Mutex<VecDeque<MockTransport>>,
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Create a connector with no transports queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transport for a future `connect()`.
    pub fn push(&self, mut transport: MockTransport) {
        transport.close_counter = Some(Arc::clone(&self.closes));
        self.transports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(transport);
    }

    /// Number of successful `connect()` calls so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of handed-out transports that have been closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of transports still queued.
    pub fn remaining(&self) -> usize {
        self.transports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        let next = self
            .transports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(transport) => {
                self.connects.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(transport))
            }
            None => Err(Error::Transport("mock connector has no transports left".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        let request = &[0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD];
        let response = &[0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x40, 0x07, 0x14, 0x00, 0xFD];
        mock.expect(request, response);

        mock.send(request).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn mock_transport_read_byte_then_timeout() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0xFE, 0xFD]);

        assert_eq!(mock.read_byte(TIMEOUT).await.unwrap(), 0xFE);
        assert_eq!(mock.unread_len(), 1);
        assert_eq!(mock.read_byte(TIMEOUT).await.unwrap(), 0xFD);
        assert!(matches!(mock.read_byte(TIMEOUT).await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01, 0x02], &[]);
        mock.expect(&[0x03, 0x04], &[]);

        mock.send(&[0x01, 0x02]).await.unwrap();
        mock.send(&[0x03, 0x04]).await.unwrap();

        assert_eq!(mock.sent_data(), &[vec![0x01, 0x02], vec![0x03, 0x04]]);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let result = mock.send(&[0x99]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        assert!(matches!(mock.send(&[0x01]).await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_silent_response_times_out() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[]);
        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, TIMEOUT).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn mock_transport_close_disconnects() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0xFE]);
        mock.close().await.unwrap();

        assert!(!mock.is_connected());
        assert!(matches!(mock.send(&[0x01]).await, Err(Error::NotConnected)));
        assert!(matches!(mock.read_byte(TIMEOUT).await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_connector_hands_out_in_order_and_counts_closes() {
        let connector = MockConnector::new();
        let mut first = MockTransport::new();
        first.push_incoming(&[0x01]);
        let mut second = MockTransport::new();
        second.push_incoming(&[0x02]);
        connector.push(first);
        connector.push(second);
        assert_eq!(connector.remaining(), 2);

        let mut t = connector.connect().await.unwrap();
        assert_eq!(t.read_byte(TIMEOUT).await.unwrap(), 0x01);
        t.close().await.unwrap();
        t.close().await.unwrap();

        let mut t = connector.connect().await.unwrap();
        assert_eq!(t.read_byte(TIMEOUT).await.unwrap(), 0x02);

        assert_eq!(connector.connect_count(), 2);
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn mock_connector_exhausted_is_transport_error() {
        let connector = MockConnector::new();
        assert!(matches!(
            connector.connect().await,
            Err(Error::Transport(_))
        ));
        assert_eq!(connector.connect_count(), 0);
    }
}
