use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::context::OperationContext;

/// A call this invocation made to an external system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTelemetry {
    /// Dependency kind (`HTTP` for every benchmark action).
    pub type_name: String,
    /// URL or `account/resource` the call was made against.
    pub target: String,
    /// Status code of the response handed back to the caller.
    pub result_code: u16,
    /// Whether the external action itself succeeded.
    pub success: bool,
    pub duration: Duration,
    /// Dependency id; the invocation's parent id.
    pub id: String,
}

/// A free-form trace message with string properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceTelemetry {
    pub message: String,
    pub properties: BTreeMap<String, String>,
}

impl TraceTelemetry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// The telemetry collaborator every dispatcher and handler reports to.
///
/// Implementations must be cheap to call from request handlers; `flush` is
/// invoked once at the end of every invocation.
pub trait Telemetry: Send + Sync {
    /// Begin the single operation of an invocation, joining `traceparent`
    /// when one was received.
    fn start_operation(&self, name: &str, traceparent: Option<&str>) -> OperationContext {
        OperationContext::from_traceparent(name, traceparent)
    }

    fn track_dependency(&self, ctx: &OperationContext, dependency: DependencyTelemetry);

    fn track_trace(&self, ctx: &OperationContext, trace: TraceTelemetry);

    fn flush(&self);
}
