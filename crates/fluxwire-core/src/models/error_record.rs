//! Record enqueued on the reserved `ERROR` channel
use crate::dispatcher::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Used when a producer reports an error without a message
pub const MISSING_ERROR_MESSAGE: &str = "An error message was not provided.";

/// `deferred_success_event` for errors raised outside any action call
pub const MANUAL_ERROR_EVENT: &str = "Manual error invocation, call site not available.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Event key of the call that failed
    #[serde(rename = "_DEFERRED_SUCCESS_EVENT")]
    pub deferred_success_event: String,
    #[serde(rename = "_ACTION_CREATOR")]
    pub action_creator: String,
    #[serde(rename = "_ACTION")]
    pub action: String,
    /// Whatever raised the error (a response, a request, ...). Null if absent
    #[serde(rename = "xhr")]
    pub source: Value,
    pub message: String,
    pub data: Value,
}

impl ErrorRecord {
    pub fn new(
        deferred_success_event: impl Into<String>,
        action_creator: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            deferred_success_event: deferred_success_event.into(),
            action_creator: action_creator.into(),
            action: action.into(),
            source: Value::Null,
            message: MISSING_ERROR_MESSAGE.to_string(),
            data: Value::Object(Map::new()),
        }
    }

    pub fn with_source(mut self, source: Option<Payload>) -> Self {
        self.source = source.unwrap_or(Value::Null);
        self
    }

    pub fn with_message(mut self, message: Option<&str>) -> Self {
        if let Some(message) = message {
            self.message = message.to_string();
        }
        self
    }

    pub fn with_data(mut self, data: Option<Payload>) -> Self {
        if let Some(data) = data {
            self.data = data;
        }
        self
    }

    pub fn has_message(&self) -> bool {
        self.message != MISSING_ERROR_MESSAGE
    }

    pub fn to_payload(&self) -> serde_json::Result<Payload> {
        serde_json::to_value(self)
    }

    pub fn from_payload(payload: &Payload) -> serde_json::Result<Self> {
        Self::deserialize(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let record = ErrorRecord::new("WIDGET_CREATE", "Widget", "create");
        assert_eq!(record.source, Value::Null);
        assert_eq!(record.message, MISSING_ERROR_MESSAGE);
        assert_eq!(record.data, json!({}));
        assert!(!record.has_message());
    }

    #[test]
    fn test_payload_field_names() {
        let record = ErrorRecord::new("WIDGET_CREATE", "Widget", "create")
            .with_source(Some(json!({"status": 500})))
            .with_message(Some("server down"))
            .with_data(Some(json!([1, 2])));
        let payload = record.to_payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "_DEFERRED_SUCCESS_EVENT": "WIDGET_CREATE",
                "_ACTION_CREATOR": "Widget",
                "_ACTION": "create",
                "xhr": {"status": 500},
                "message": "server down",
                "data": [1, 2],
            })
        );
        assert_eq!(ErrorRecord::from_payload(&payload).unwrap(), record);
    }
}
