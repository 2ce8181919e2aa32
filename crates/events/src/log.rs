//! Call-site helper pairing a local log line with a remote event.

use std::sync::Arc;

use crate::event::{Event, EventLevel};
use crate::sink::EventSink;

/// Message used for failures that are not the job author's to fix.
pub const APPLICATION_ERROR_MESSAGE: &str = "Application error";

/// Description attached to [`APPLICATION_ERROR_MESSAGE`] events.
pub const APPLICATION_ERROR_DESCRIPTION: &str = "Contact support";

/// Emits audit events for one run.
///
/// Every method logs locally through `tracing` at the matching level and
/// then forwards the event. Delivery failures are logged at warn level and
/// otherwise ignored.
#[derive(Clone)]
pub struct EventLog {
    sink: Arc<dyn EventSink>,
    component: String,
    run_id: String,
}

impl EventLog {
    pub fn new(sink: Arc<dyn EventSink>, component: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            sink,
            component: component.into(),
            run_id: run_id.into(),
        }
    }

    pub async fn info(&self, message: &str) {
        tracing::info!("{message}");
        self.send(self.event(EventLevel::Info, message)).await;
    }

    /// Like [`info`](Self::info), with a structured result payload.
    pub async fn info_with_results(&self, message: &str, results: serde_json::Value) {
        tracing::info!(%results, "{message}");
        self.send(self.event(EventLevel::Info, message).with_results(results))
            .await;
    }

    /// A user-facing failure; the message is forwarded verbatim.
    pub async fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.send(self.event(EventLevel::Error, message)).await;
    }

    /// An internal failure; the remote event carries a generic message.
    pub async fn application_error(&self, detail: &str) {
        tracing::error!("{APPLICATION_ERROR_MESSAGE}");
        tracing::debug!(detail, "Application error detail");
        let event = self
            .event(EventLevel::Error, APPLICATION_ERROR_MESSAGE)
            .with_description(APPLICATION_ERROR_DESCRIPTION);
        self.send(event).await;
    }

    fn event(&self, level: EventLevel, message: &str) -> Event {
        Event::new(&self.component, &self.run_id, level, message)
    }

    async fn send(&self, event: Event) {
        if let Err(e) = self.sink.emit(&event).await {
            tracing::warn!(error = %e, "Event delivery failed");
        }
    }
}
