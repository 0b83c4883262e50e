//! CivBuilder -- fluent builder for [`CivRadio`] and [`CivClient`].
//!
//! Separates configuration from construction so callers can set the CI-V
//! address pair, serial parameters, response timeout, and acknowledgement
//! policy before any port is opened.
//!
//! # Example
//!
//! ```no_run
//! use civctl_icom::builder::CivBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> civctl_core::Result<()> {
//! let mut radio = CivBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .controller_address(0xC0)
//!     .command_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! let freq = radio.get_frequency().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use civctl_core::error::{Error, Result};
use civctl_core::transport::{Connector, Transport};
use civctl_core::types::{CivAddress, DEFAULT_CONTROLLER_ADDR, DEFAULT_RADIO_ADDR};
use civctl_transport::{SerialConnector, SerialTransport, DEFAULT_BAUD_RATE};

use crate::client::CivClient;
use crate::radio::CivRadio;

/// Default response window for one command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// What a set command does after writing its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    /// Write the frame and return. Whatever the radio answers is discarded
    /// before the next command.
    #[default]
    Ignore,
    /// Wait for the radio's reply: ACK succeeds, NAK fails with
    /// [`Error::Rejected`], anything else is a protocol error.
    Require,
}

/// Settings shared by every command in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Radio/controller address pair.
    pub address: CivAddress,
    /// Window for a complete reply frame.
    pub command_timeout: Duration,
    /// Set-command acknowledgement handling.
    pub ack_policy: AckPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            address: CivAddress::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            ack_policy: AckPolicy::default(),
        }
    }
}

/// Fluent builder for [`CivRadio`] (one held-open transport) and
/// [`CivClient`] (a fresh transport per operation).
#[derive(Debug, Clone)]
pub struct CivBuilder {
    radio_addr: u8,
    controller_addr: u8,
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
    ack_policy: AckPolicy,
}

impl Default for CivBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CivBuilder {
    /// Create a builder with IC-7300 defaults.
    pub fn new() -> Self {
        CivBuilder {
            radio_addr: DEFAULT_RADIO_ADDR,
            controller_addr: DEFAULT_CONTROLLER_ADDR,
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            ack_policy: AckPolicy::Ignore,
        }
    }

    /// Set the radio's CI-V address (default `0x94`).
    ///
    /// Must match the "CI-V Address" item in the radio's menu.
    pub fn radio_address(mut self, addr: u8) -> Self {
        self.radio_addr = addr;
        self
    }

    /// Set this controller's CI-V address (default `0xE0`).
    pub fn controller_address(mut self, addr: u8) -> Self {
        self.controller_addr = addr;
        self
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the baud rate (default 115200).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the window for a complete reply frame (default 500ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the acknowledgement policy for set commands.
    pub fn ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    /// The session settings this builder will produce.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            address: CivAddress::new(self.radio_addr, self.controller_addr),
            command_timeout: self.command_timeout,
            ack_policy: self.ack_policy,
        }
    }

    fn require_port(&self) -> Result<&str> {
        self.serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required".into()))
    }

    /// Build a [`CivRadio`] over a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport`).
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> CivRadio {
        CivRadio::new(transport, self.config())
    }

    /// Open the serial port and build a [`CivRadio`] that holds it.
    pub async fn build(self) -> Result<CivRadio> {
        let transport = SerialTransport::open(self.require_port()?, self.baud_rate).await?;
        Ok(self.build_with_transport(Box::new(transport)))
    }

    /// Build a [`CivClient`] over a caller-provided connector.
    pub fn build_client_with_connector(self, connector: Box<dyn Connector>) -> CivClient {
        CivClient::new(connector, self.config())
    }

    /// Build a [`CivClient`] that opens the serial port once per operation.
    ///
    /// No port is opened here; a bad path surfaces on the first operation.
    pub fn build_client(self) -> Result<CivClient> {
        let connector = SerialConnector::new(self.require_port()?, self.baud_rate);
        Ok(self.build_client_with_connector(Box::new(connector)))
    }
}
