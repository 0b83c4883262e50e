//! Error types for civctl.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, CI-V framing
//! problems, field decode errors, and radio rejections are all captured here.

/// The error type for all civctl operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (the serial port could not be opened, etc).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response was framed correctly but its contents could not be
    /// decoded (too short, invalid BCD digit, impossible date or time).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The byte stream did not form a valid CI-V frame start.
    ///
    /// Raised when a preamble byte is not immediately followed by a second
    /// preamble byte.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// No complete frame arrived within the response window.
    ///
    /// Covers both a missing frame start and a frame whose terminator never
    /// arrived. Usually means the radio is off, the baud rate is wrong, or
    /// the CI-V address does not match the radio's menu setting.
    #[error("timeout waiting for response")]
    Timeout,

    /// The radio answered with a negative acknowledgement (NAK).
    #[error("command rejected by radio (NAK)")]
    Rejected,

    /// A value passed to a command cannot be represented on the wire.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The transport has been closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the radio was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
