//! civctl-test-harness: mock transports for testing civctl.
//!
//! [`MockTransport`] scripts request/response exchanges so the CI-V codec
//! and drivers can be tested byte-for-byte without a radio.
//! [`MockConnector`] hands out pre-scripted transports one per connection
//! and counts how many of them were closed.

pub mod mock_serial;

pub use mock_serial::{MockConnector, MockTransport};
