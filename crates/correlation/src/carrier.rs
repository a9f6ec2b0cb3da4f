//! Emit/recover carriers for the operation identifier.
//!
//! A carrier embeds the *current* operation id into the payload of a
//! downstream action (emit) and extracts it again on the receiving side
//! (recover). Adding a transport means implementing [`CorrelationCarrier`]
//! for its payload type.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderMap;

use crate::context::OperationContext;
use crate::error::CorrelationError;
use crate::trace_context::extract_span_context;

/// Blob metadata key holding the operation id. Azure lower-cases metadata
/// keys, so lookups are case-insensitive.
pub const OPERATION_ID_METADATA_KEY: &str = "operationid";

/// Two-phase protocol linking an operation to the one that triggered it.
pub trait CorrelationCarrier {
    /// What the identifier travels in.
    type Payload: ?Sized;

    /// Short transport name used in errors and logs.
    fn transport(&self) -> &'static str;

    /// Embed `ctx`'s operation id into `payload`.
    fn emit(&self, ctx: &OperationContext, payload: &mut Self::Payload);

    /// Extract the operation id previously embedded by [`emit`](Self::emit).
    fn recover(&self, payload: &Self::Payload) -> Result<String, CorrelationError>;
}

/// Carries the operation id as the trace id of a W3C `traceparent` header.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpHeaderCarrier;

impl CorrelationCarrier for HttpHeaderCarrier {
    type Payload = HeaderMap;

    fn transport(&self) -> &'static str {
        "traceparent header"
    }

    fn emit(&self, ctx: &OperationContext, payload: &mut HeaderMap) {
        ctx.inject(payload);
    }

    fn recover(&self, payload: &HeaderMap) -> Result<String, CorrelationError> {
        extract_span_context(payload)
            .map(|sc| sc.trace_id().to_string())
            .ok_or(CorrelationError::Missing(self.transport()))
    }
}

/// Carries the operation id as the base64-encoded text of a queue message.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueueMessageCarrier;

impl CorrelationCarrier for QueueMessageCarrier {
    type Payload = String;

    fn transport(&self) -> &'static str {
        "queue message"
    }

    fn emit(&self, ctx: &OperationContext, payload: &mut String) {
        *payload = STANDARD.encode(ctx.operation_id());
    }

    fn recover(&self, payload: &String) -> Result<String, CorrelationError> {
        let text = payload.trim();
        if text.is_empty() {
            return Err(CorrelationError::Missing(self.transport()));
        }
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| CorrelationError::Malformed {
                transport: self.transport(),
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| CorrelationError::Malformed {
            transport: self.transport(),
            reason: e.to_string(),
        })
    }
}

/// Carries the operation id in the `operationid` metadata field of a blob.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobMetadataCarrier;

impl CorrelationCarrier for BlobMetadataCarrier {
    type Payload = HashMap<String, String>;

    fn transport(&self) -> &'static str {
        "blob metadata"
    }

    fn emit(&self, ctx: &OperationContext, payload: &mut HashMap<String, String>) {
        payload.insert(
            OPERATION_ID_METADATA_KEY.to_owned(),
            ctx.operation_id().to_owned(),
        );
    }

    fn recover(&self, payload: &HashMap<String, String>) -> Result<String, CorrelationError> {
        payload
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(OPERATION_ID_METADATA_KEY))
            .map(|(_, value)| value.clone())
            .ok_or(CorrelationError::Missing(self.transport()))
    }
}
