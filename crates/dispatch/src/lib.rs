//! Benchmark dispatchers and inbound trigger handlers.
//!
//! [`BenchmarkDispatcher`] is the outbound half of a benchmark: it validates
//! a query and performs one external action that carries the current
//! operation id. [`HttpTriggerHandler`], [`QueueTriggerHandler`] and
//! [`BlobCreatedHandler`] are the inbound half, invoked by that action.

pub mod dispatcher;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod test_support;

pub use dispatcher::{BenchmarkDispatcher, BenchmarkSettings, INFRA_OPERATION, benchmark_blob_name};
pub use error::DispatchError;
pub use handlers::{
    BlobCreatedHandler, HTTP_TRIGGER_OPERATION, HttpTriggerHandler, QUEUE_TRIGGER_OPERATION,
    QueueTriggerHandler, STORAGE_TRIGGER_OPERATION, find_blob,
};
