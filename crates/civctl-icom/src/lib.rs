//! Icom CI-V protocol codec and radio drivers for civctl.
//!
//! This crate implements the slice of the Icom CI-V (Communication
//! Interface V) binary protocol needed to read and set an IC-7300's clock
//! and to read its frequency and mode. It provides:
//!
//! - **Frame codec** ([`civ`]) -- encode outbound frames and read one
//!   inbound frame at a time off a [`Transport`](civctl_core::Transport).
//! - **BCD transcoders** ([`bcd`]) -- frequency, time-of-day, and date
//!   fields in packed BCD.
//! - **Command catalog** ([`commands`]) -- request builders and response
//!   decoders for each supported operation.
//! - **CivRadio** ([`radio`]) -- a driver holding one transport open for a
//!   whole session.
//! - **CivClient** ([`client`]) -- a driver that opens and closes a
//!   transport around every operation.
//! - **CivBuilder** ([`builder`]) -- fluent construction of both drivers.
//!
//! # Example
//!
//! ```
//! use civctl_core::CivAddress;
//! use civctl_icom::civ::Response;
//! use civctl_icom::commands::{cmd_read_frequency, parse_frequency_response};
//!
//! // Build a "read frequency" command for an IC-7300
//! let cmd = cmd_read_frequency(CivAddress::default());
//! assert_eq!(cmd, vec![0xFE, 0xFE, 0x94, 0xE0, 0x03, 0xFD]);
//!
//! // Decode the body of the radio's reply
//! let reply = Response::new(vec![0xE0, 0x94, 0x03, 0x00, 0x14, 0x00, 0x30, 0x00]);
//! assert_eq!(parse_frequency_response(&reply).unwrap(), 30_001_400);
//! ```

pub mod bcd;
pub mod builder;
pub mod civ;
pub mod client;
pub mod commands;
pub mod radio;

pub use builder::{AckPolicy, CivBuilder, SessionConfig};
pub use client::CivClient;
pub use radio::CivRadio;
