//! Envelope of non-HTTP invocations exchanged with the Functions host.
//!
//! The host posts `{"Data": {...}, "Metadata": {...}}` where `Data` is keyed
//! by binding name, and expects `{"Outputs": {...}, "Logs": [...],
//! "ReturnValue": ...}` back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trigbench_core::DispatchResult;

/// Binding name of the queue trigger in `QueueTrigger/function.json`.
pub const QUEUE_BINDING: &str = "queueMessage";

/// Binding name of the Event Grid trigger in `StorageTrigger/function.json`.
pub const EVENT_BINDING: &str = "event";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    pub outputs: Map<String, Value>,
    pub logs: Vec<String>,
    pub return_value: Value,
}

impl InvocationResponse {
    /// Wrap a handler result: the body becomes the return value and the
    /// single log line.
    pub fn from_result(result: DispatchResult) -> Self {
        Self {
            outputs: Map::new(),
            logs: vec![result.body.clone()],
            return_value: Value::String(result.body),
        }
    }
}

/// `Data.event` may arrive as an object or as its JSON text.
#[derive(Debug, Deserialize)]
struct BlobCreatedEvent {
    data: BlobCreatedData,
}

#[derive(Debug, Deserialize)]
struct BlobCreatedData {
    url: String,
}

impl InvocationRequest {
    /// Raw text of the queue message.
    ///
    /// The host hands string messages over as JSON strings, sometimes with
    /// the quotes still embedded; both forms yield the bare text.
    pub fn queue_message(&self) -> Option<String> {
        match self.data.get(QUEUE_BINDING)? {
            Value::String(text) => Some(text.trim_matches('"').to_owned()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// URL of the created blob: `data.url` of the Event Grid event, or the
    /// `Uri` metadata a blob trigger binding provides.
    pub fn blob_url(&self) -> Option<String> {
        let from_event = match self.data.get(EVENT_BINDING) {
            Some(Value::String(text)) => serde_json::from_str::<BlobCreatedEvent>(text).ok(),
            Some(value) => serde_json::from_value::<BlobCreatedEvent>(value.clone()).ok(),
            None => None,
        };
        from_event.map(|event| event.data.url).or_else(|| {
            self.metadata
                .get("Uri")
                .and_then(Value::as_str)
                .map(|uri| uri.trim_matches('"').to_owned())
        })
    }
}
