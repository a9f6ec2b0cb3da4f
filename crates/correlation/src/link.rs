use crate::carrier::CorrelationCarrier;
use crate::context::OperationContext;
use crate::error::CorrelationError;
use crate::telemetry::{Telemetry, TraceTelemetry};

/// Message of the trace event linking two operations.
pub const LINK_TRACE_MESSAGE: &str = "Custom operationId";

/// Record that `current` was triggered by the operation `recovered_id`.
///
/// The pairing lives in a trace event because the two operations were started
/// by independent invocations and share no parent/child relationship.
pub fn record_link(telemetry: &dyn Telemetry, current: &OperationContext, recovered_id: &str) {
    let trace = TraceTelemetry::new(LINK_TRACE_MESSAGE)
        .with_property("oldOperationId", recovered_id)
        .with_property("newOperationId", current.operation_id());
    telemetry.track_trace(current, trace);
}

/// Recover the carried id from `payload` and, on success, record the link.
pub fn recover_and_link<C: CorrelationCarrier>(
    carrier: &C,
    payload: &C::Payload,
    telemetry: &dyn Telemetry,
    current: &OperationContext,
) -> Result<String, CorrelationError> {
    let recovered = carrier.recover(payload)?;
    record_link(telemetry, current, &recovered);
    Ok(recovered)
}
