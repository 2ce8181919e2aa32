//! Event delivery trait and in-process sinks.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::event::Event;

/// Error type for event delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Event endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

/// Destination for remote events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &Event) -> Result<(), EventError>;
}

/// Sink that drops every event. Used when forwarding is disabled.
#[derive(Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn emit(&self, _event: &Event) -> Result<(), EventError> {
        Ok(())
    }
}

/// Sink that keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, event: &Event) -> Result<(), EventError> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}
