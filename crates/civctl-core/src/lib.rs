//! civctl-core: Core traits, types, and error definitions for civctl.
//!
//! This crate holds the pieces shared by the transport, the CI-V protocol
//! crate, and the CLI, so none of them depend on each other's internals.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Connector`] -- opens a fresh transport per operation
//! - [`CivAddress`] -- radio/controller address pair
//! - [`Mode`] -- operating mode, including unknown codes
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use helpers::{format_dmy, format_freq_mhz, format_hhmm};
pub use transport::{Connector, Transport};
pub use types::*;
