//! CivRadio -- a CI-V session over one held-open transport.
//!
//! Ties the frame codec ([`civ`]), the field transcoders ([`bcd`]) and the
//! command catalog ([`commands`]) to a [`Transport`]. Every operation takes
//! `&mut self`: one command owns the link from the write until its reply
//! frame has been read, and nothing is pipelined.
//!
//! [`bcd`]: crate::bcd

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tokio::time::Instant;
use tracing::{debug, trace};

use civctl_core::error::{Error, Result};
use civctl_core::transport::Transport;
use civctl_core::types::{CivAddress, Mode};

use crate::builder::{AckPolicy, SessionConfig};
use crate::civ::{self, Response};
use crate::commands::{self, Operation};

/// Upper bound on stale bytes discarded before a command.
const MAX_STALE_BYTES: usize = 4096;

/// A connected Icom transceiver controlled over CI-V.
///
/// Constructed via [`CivBuilder`](crate::builder::CivBuilder).
pub struct CivRadio {
    transport: Box<dyn Transport>,
    config: SessionConfig,
}

impl CivRadio {
    pub(crate) fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        CivRadio { transport, config }
    }

    /// The settings this session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The radio/controller address pair.
    pub fn address(&self) -> CivAddress {
        self.config.address
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Drop whatever is already waiting in the receive buffer.
    ///
    /// Leftovers are replies nobody waited for (ACKs of fire-and-forget
    /// sets, echoes, late frames after a timeout). Without this, the next
    /// read would decode them as its own answer.
    async fn discard_pending(&mut self) -> Result<()> {
        let mut buf = [0u8; 64];
        let mut discarded = 0;
        while discarded < MAX_STALE_BYTES {
            match self.transport.receive(&mut buf, Duration::ZERO).await {
                Ok(0) | Err(Error::Timeout) => break,
                Ok(n) => {
                    trace!("discarding stale bytes {:02X?}", &buf[..n]);
                    discarded += n;
                }
                Err(e) => return Err(e),
            }
        }
        if discarded > 0 {
            debug!(discarded, "discarded stale input before command");
        }
        Ok(())
    }

    /// Read frames until one that is not an echo of our own request.
    async fn read_reply(&mut self, request: &[u8], deadline: Instant) -> Result<Response> {
        loop {
            let left = deadline
                .checked_duration_since(Instant::now())
                .ok_or(Error::Timeout)?;
            let frame = civ::read_frame(self.transport.as_mut(), left).await?;
            if frame.is_echo_of(request) {
                debug!("skipping CI-V echo frame");
                continue;
            }
            return Ok(frame);
        }
    }

    /// Send a read command and return the radio's data reply.
    async fn query(&mut self, op: Operation, request: &[u8]) -> Result<Response> {
        self.discard_pending().await?;
        debug!(%op, address = %self.config.address, "sending CI-V command");
        self.transport.send(request).await?;

        let deadline = Instant::now() + self.config.command_timeout;
        let reply = self.read_reply(request, deadline).await?;
        if reply.is_nak() {
            debug!(%op, "radio answered NAK");
            return Err(Error::Rejected);
        }
        Ok(reply)
    }

    /// Send a set command, honouring the acknowledgement policy.
    async fn execute(&mut self, op: Operation, request: &[u8]) -> Result<()> {
        self.discard_pending().await?;
        debug!(%op, address = %self.config.address, "sending CI-V command");
        self.transport.send(request).await?;

        match self.config.ack_policy {
            AckPolicy::Ignore => Ok(()),
            AckPolicy::Require => {
                let deadline = Instant::now() + self.config.command_timeout;
                let reply = self.read_reply(request, deadline).await?;
                if reply.is_ack() {
                    Ok(())
                } else if reply.is_nak() {
                    debug!(%op, "radio answered NAK");
                    Err(Error::Rejected)
                } else {
                    Err(Error::Protocol(format!(
                        "expected ACK for {op}, got {:02X?}",
                        reply.as_bytes()
                    )))
                }
            }
        }
    }

    /// Read the radio's clock time.
    pub async fn get_time(&mut self) -> Result<NaiveTime> {
        let cmd = commands::cmd_read_time(self.config.address);
        let reply = self.query(Operation::ReadTime, &cmd).await?;
        commands::parse_time_response(&reply)
    }

    /// Set the radio's clock time (hour and minute; seconds are dropped).
    pub async fn set_time(&mut self, time: NaiveTime) -> Result<()> {
        let cmd = commands::cmd_set_time(self.config.address, time);
        self.execute(Operation::SetTime, &cmd).await
    }

    /// Read the radio's clock date.
    pub async fn get_date(&mut self) -> Result<NaiveDate> {
        let cmd = commands::cmd_read_date(self.config.address);
        let reply = self.query(Operation::ReadDate, &cmd).await?;
        commands::parse_date_response(&reply)
    }

    /// Set the radio's clock date.
    pub async fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        let cmd = commands::cmd_set_date(self.config.address, date)?;
        self.execute(Operation::SetDate, &cmd).await
    }

    /// Read the operating frequency in hertz.
    pub async fn get_frequency(&mut self) -> Result<u64> {
        let cmd = commands::cmd_read_frequency(self.config.address);
        let reply = self.query(Operation::ReadFrequency, &cmd).await?;
        commands::parse_frequency_response(&reply)
    }

    /// Read the operating mode.
    pub async fn get_mode(&mut self) -> Result<Mode> {
        let cmd = commands::cmd_read_mode(self.config.address);
        let reply = self.query(Operation::ReadMode, &cmd).await?;
        commands::parse_mode_response(&reply)
    }
}
