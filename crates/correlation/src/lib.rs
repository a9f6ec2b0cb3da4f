//! Cross-trigger correlation for trigbench.
//!
//! Every invocation starts exactly one [`OperationContext`] through the
//! [`Telemetry`] collaborator. Benchmark dispatchers *emit* the current
//! operation id into the payload of their downstream action through a
//! [`CorrelationCarrier`]; the handler invoked by that action later
//! *recovers* it and records a link trace pairing the recovered id with its
//! own, so the two otherwise unrelated tracing sessions can be joined.
//!
//! | Transport | Carrier | Payload |
//! |---|---|---|
//! | HTTP | [`HttpHeaderCarrier`] | W3C `traceparent` header |
//! | Blob | [`BlobMetadataCarrier`] | `operationid` blob metadata |
//! | Queue | [`QueueMessageCarrier`] | base64 message text |

pub mod carrier;
pub mod context;
pub mod error;
pub mod link;
pub mod memory;
pub mod telemetry;
pub mod trace_context;
pub mod tracing_telemetry;

pub use carrier::{
    BlobMetadataCarrier, CorrelationCarrier, HttpHeaderCarrier, OPERATION_ID_METADATA_KEY,
    QueueMessageCarrier,
};
pub use context::OperationContext;
pub use error::CorrelationError;
pub use link::{LINK_TRACE_MESSAGE, recover_and_link, record_link};
pub use memory::{MemoryTelemetry, TelemetryEvent};
pub use telemetry::{DependencyTelemetry, Telemetry, TraceTelemetry};
pub use tracing_telemetry::TracingTelemetry;
