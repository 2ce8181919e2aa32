//! Event delivery to the Storage API events endpoint.
//!
//! [`StorageApiEventSink`] POSTs each [`Event`] as JSON to
//! `{api_url}/v2/storage/events`. One attempt per event; no retry.

use std::time::Duration;

use async_trait::async_trait;

use crate::event::Event;
use crate::sink::{EventError, EventSink};

/// HTTP request timeout for a single event.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwards events to the Storage API.
pub struct StorageApiEventSink {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl StorageApiEventSink {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, EventError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl EventSink for StorageApiEventSink {
    async fn emit(&self, event: &Event) -> Result<(), EventError> {
        let response = self
            .client
            .post(format!("{}/v2/storage/events", self.api_url))
            .header("X-StorageApi-Token", &self.token)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}
