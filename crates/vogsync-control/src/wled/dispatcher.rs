use futures::future::{BoxFuture, FutureExt};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use vogsync_core::Rgb;

use super::protocol::{state_url, StateCommand};
use crate::dispatch::{DispatchStats, StatsSnapshot, ZoneDispatch};
use crate::error::{ControlError, Result};

/// HTTP dispatcher for WLED controllers.
///
/// One client is shared by every zone so connections are reused between frames.
/// Every request, including connect, is bounded by `timeout`.
#[derive(Debug)]
pub struct WledDispatcher {
    client: reqwest::Client,
    stats: DispatchStats,
}

impl WledDispatcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        tracing::info!("WLED dispatcher ready (timeout {:?})", timeout);

        Ok(Self {
            client,
            stats: DispatchStats::default(),
        })
    }

    /// Send one command and report the outcome.
    pub async fn try_send(&self, endpoint: &str, brightness: u8, color: Rgb) -> Result<()> {
        let url = state_url(endpoint)?;
        let body = StateCommand::new(brightness, color).to_json()?;

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ControlError::Status {
                endpoint: endpoint.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

impl ZoneDispatch for WledDispatcher {
    fn send<'a>(&'a self, endpoint: &'a str, brightness: u8, color: Rgb) -> BoxFuture<'a, ()> {
        async move {
            match self.try_send(endpoint, brightness, color).await {
                Ok(()) => self.stats.record_sent(),
                Err(e) => {
                    self.stats.record_failed();
                    tracing::debug!("WLED send to {} dropped: {}", endpoint, e);
                }
            }
        }
        .boxed()
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
