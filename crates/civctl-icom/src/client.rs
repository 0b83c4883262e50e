//! CivClient -- one transport per operation.
//!
//! Each call opens a link through its [`Connector`], runs exactly one
//! command on it, and closes it again whether the command succeeded or not.
//! Nothing carries over between calls, so a stale reply from one operation
//! can never be read by the next.

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use civctl_core::error::Result;
use civctl_core::transport::Connector;
use civctl_core::types::Mode;

use crate::builder::SessionConfig;
use crate::radio::CivRadio;

/// Per-call CI-V driver.
///
/// Constructed via [`CivBuilder::build_client`](crate::builder::CivBuilder::build_client)
/// or [`CivBuilder::build_client_with_connector`](crate::builder::CivBuilder::build_client_with_connector).
pub struct CivClient {
    connector: Box<dyn Connector>,
    config: SessionConfig,
}

impl CivClient {
    pub(crate) fn new(connector: Box<dyn Connector>, config: SessionConfig) -> Self {
        CivClient { connector, config }
    }

    /// The settings every operation runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn open(&self) -> Result<CivRadio> {
        let transport = self.connector.connect().await?;
        debug!(address = %self.config.address, "opened CI-V link");
        Ok(CivRadio::new(transport, self.config))
    }

    /// Close the link and hand back the operation's own result.
    ///
    /// A failed close is logged, never allowed to mask the result.
    async fn release<T>(mut radio: CivRadio, result: Result<T>) -> Result<T> {
        if let Err(e) = radio.close().await {
            warn!("failed to close CI-V link: {e}");
        }
        result
    }

    /// Read the radio's clock time.
    pub async fn get_time(&self) -> Result<NaiveTime> {
        let mut radio = self.open().await?;
        let result = radio.get_time().await;
        Self::release(radio, result).await
    }

    /// Set the radio's clock time.
    pub async fn set_time(&self, time: NaiveTime) -> Result<()> {
        let mut radio = self.open().await?;
        let result = radio.set_time(time).await;
        Self::release(radio, result).await
    }

    /// Read the radio's clock date.
    pub async fn get_date(&self) -> Result<NaiveDate> {
        let mut radio = self.open().await?;
        let result = radio.get_date().await;
        Self::release(radio, result).await
    }

    /// Set the radio's clock date.
    pub async fn set_date(&self, date: NaiveDate) -> Result<()> {
        let mut radio = self.open().await?;
        let result = radio.set_date(date).await;
        Self::release(radio, result).await
    }

    /// Read the operating frequency in hertz.
    pub async fn get_frequency(&self) -> Result<u64> {
        let mut radio = self.open().await?;
        let result = radio.get_frequency().await;
        Self::release(radio, result).await
    }

    /// Read the operating mode.
    pub async fn get_mode(&self) -> Result<Mode> {
        let mut radio = self.open().await?;
        let result = radio.get_mode().await;
        Self::release(radio, result).await
    }
}
