//! Transport implementations for civctl.
//!
//! Provides [`SerialTransport`], the [`Transport`](civctl_core::Transport)
//! implementation for USB virtual COM ports and RS-232 CI-V interfaces, and
//! [`SerialConnector`], which opens a fresh serial transport per operation.

pub mod serial;

pub use serial::{
    DataBits, FlowControl, Parity, SerialConfig, SerialConnector, SerialTransport, StopBits,
    DEFAULT_BAUD_RATE,
};
