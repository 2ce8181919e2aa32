//! Event envelope.

use serde::Serialize;

/// Severity of a remote event. Debug-level messages are never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// One event sent to the monitoring service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Name of the emitting component.
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub level: EventLevel,
    #[serde(rename = "runId")]
    pub run_id: String,
    pub params: serde_json::Value,
    pub results: serde_json::Value,
}

impl Event {
    pub fn new(
        component: impl Into<String>,
        run_id: impl Into<String>,
        level: EventLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
            description: None,
            level,
            run_id: run_id.into(),
            params: serde_json::json!({}),
            results: serde_json::json!({}),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_results(mut self, results: serde_json::Value) -> Self {
        self.results = results;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let event = Event::new("lgr-runner", "r-1", EventLevel::Warn, "careful");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "warn");
        assert_eq!(json["runId"], "r-1");
        assert_eq!(json["component"], "lgr-runner");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn description_is_included_when_set() {
        let event =
            Event::new("c", "r", EventLevel::Error, "Application error").with_description("Contact support");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["description"], "Contact support");
    }
}
