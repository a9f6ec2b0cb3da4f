use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::trigger::TriggerKind;

/// Content type of every dispatch result body.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Body returned when the benchmark query fails validation.
pub const INVALID_PARAMETERS_BODY: &str =
    "AZURE - Benchmark failed to start\n\nError: Invalid query parameters";

/// Uniform response produced by every dispatcher and trigger handler.
///
/// The status code is 200 even when the external action failed: the failure
/// is reported in `body`, and pass/fail judgment is left to the tracing
/// backend. Callers must not infer success from `status_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl DispatchResult {
    /// A 200 `text/plain` result with the given body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), CONTENT_TYPE_TEXT.to_owned());
        Self {
            status_code: 200,
            headers,
            body: body.into(),
        }
    }

    /// The external action for `kind` completed.
    #[must_use]
    pub fn started(kind: TriggerKind) -> Self {
        let body = match kind {
            TriggerKind::Http => "AZURE - HTTP trigger successfully started",
            TriggerKind::Storage => "AZURE - Storage trigger benchmark successfully started",
            TriggerKind::Queue => "AZURE - Queue trigger benchmark successfully started",
        };
        Self::ok(body)
    }

    /// The external action for `kind` failed with `message`.
    #[must_use]
    pub fn failed_to_start(kind: TriggerKind, message: &str) -> Self {
        let label = match kind {
            TriggerKind::Http => "HTTP",
            TriggerKind::Storage => "Storage",
            TriggerKind::Queue => "Queue",
        };
        Self::ok(format!(
            "AZURE - {label} trigger benchmark failed to start\n\nError: {message}"
        ))
    }

    /// The query parameters were missing or invalid.
    #[must_use]
    pub fn invalid_parameters() -> Self {
        Self::ok(INVALID_PARAMETERS_BODY)
    }

    /// Value of the `content-type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_sets_text_plain() {
        let result = DispatchResult::ok("hello");
        assert_eq!(result.status_code, 200);
        assert_eq!(result.content_type(), Some("text/plain"));
        assert_eq!(result.body, "hello");
    }

    #[test]
    fn started_bodies() {
        assert_eq!(
            DispatchResult::started(TriggerKind::Http).body,
            "AZURE - HTTP trigger successfully started"
        );
        assert_eq!(
            DispatchResult::started(TriggerKind::Queue).body,
            "AZURE - Queue trigger benchmark successfully started"
        );
    }

    #[test]
    fn failure_keeps_status_200() {
        let result = DispatchResult::failed_to_start(TriggerKind::Storage, "container not found");
        assert_eq!(result.status_code, 200);
        assert!(result.body.contains("failed to start"));
        assert!(result.body.ends_with("Error: container not found"));
    }

    #[test]
    fn invalid_parameters_body() {
        let result = DispatchResult::invalid_parameters();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, INVALID_PARAMETERS_BODY);
    }

    #[test]
    fn serde_roundtrip() {
        let result = DispatchResult::started(TriggerKind::Storage);
        let json = serde_json::to_string(&result).unwrap();
        let back: DispatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
