//! Inbound trigger handlers.
//!
//! Each handler is the receiving end of a benchmark: it starts its own
//! operation, recovers the operation id the dispatcher embedded in the
//! trigger payload, records the link, and runs the workload. A missing or
//! unreadable id is logged and never fails the invocation.

use std::sync::Arc;

use futures::TryStreamExt;
use reqwest::header::HeaderMap;
use tracing::{Span, debug, info, instrument, warn};
use trigbench_azure::{BlobItem, BlobStore, StorageConnector};
use trigbench_core::{BlobLocation, DispatchResult, workload};
use trigbench_correlation::trace_context::TRACEPARENT;
use trigbench_correlation::{
    BlobMetadataCarrier, OperationContext, QueueMessageCarrier, Telemetry, recover_and_link,
};

use crate::error::DispatchError;

pub const HTTP_TRIGGER_OPERATION: &str = "HttpTrigger";
pub const QUEUE_TRIGGER_OPERATION: &str = "QueueTrigger";
pub const STORAGE_TRIGGER_OPERATION: &str = "StorageTrigger";

/// Target of the HTTP benchmark. Correlation is native here: the caller's
/// `traceparent` makes this operation a child of the benchmark run.
#[derive(Clone)]
pub struct HttpTriggerHandler {
    telemetry: Arc<dyn Telemetry>,
    workload_n: u32,
}

impl HttpTriggerHandler {
    pub fn new(telemetry: Arc<dyn Telemetry>, workload_n: u32) -> Self {
        Self {
            telemetry,
            workload_n,
        }
    }

    #[instrument(name = "trigger.http", skip_all, fields(operation_id = tracing::field::Empty))]
    pub fn handle(&self, headers: &HeaderMap) -> DispatchResult {
        let traceparent = headers.get(TRACEPARENT).and_then(|v| v.to_str().ok());
        let ctx = self
            .telemetry
            .start_operation(HTTP_TRIGGER_OPERATION, traceparent);
        Span::current().record("operation_id", ctx.operation_id());

        if ctx.parent_id() == ctx.operation_id() {
            debug!("no caller trace, started a root operation");
        } else {
            info!(parent_id = %ctx.parent_id(), "joined caller trace");
        }

        let result = workload::run(self.workload_n);
        self.telemetry.flush();
        result
    }
}

/// Receives the messages sent by the queue benchmark.
#[derive(Clone)]
pub struct QueueTriggerHandler {
    telemetry: Arc<dyn Telemetry>,
    workload_n: u32,
}

impl QueueTriggerHandler {
    pub fn new(telemetry: Arc<dyn Telemetry>, workload_n: u32) -> Self {
        Self {
            telemetry,
            workload_n,
        }
    }

    /// `message` is the raw message text as delivered by the host.
    #[instrument(name = "trigger.queue", skip_all, fields(operation_id = tracing::field::Empty))]
    pub fn handle(&self, message: &str) -> DispatchResult {
        let ctx = self
            .telemetry
            .start_operation(QUEUE_TRIGGER_OPERATION, None);
        Span::current().record("operation_id", ctx.operation_id());

        let payload = message.to_owned();
        match recover_and_link(&QueueMessageCarrier, &payload, self.telemetry.as_ref(), &ctx) {
            Ok(linked) => info!(linked_operation_id = %linked, "correlated queue message"),
            Err(e) => warn!(error = %e, "queue message carried no usable operation id"),
        }

        let result = workload::run(self.workload_n);
        self.telemetry.flush();
        result
    }
}

/// Receives blob-created events for blobs uploaded by the storage benchmark.
#[derive(Clone)]
pub struct BlobCreatedHandler {
    storage: Arc<dyn StorageConnector>,
    telemetry: Arc<dyn Telemetry>,
    workload_n: u32,
}

impl BlobCreatedHandler {
    pub fn new(
        storage: Arc<dyn StorageConnector>,
        telemetry: Arc<dyn Telemetry>,
        workload_n: u32,
    ) -> Self {
        Self {
            storage,
            telemetry,
            workload_n,
        }
    }

    /// `blob_url` is the `data.url` of the blob-created event.
    #[instrument(name = "trigger.storage", skip(self), fields(operation_id = tracing::field::Empty))]
    pub async fn handle(&self, blob_url: &str) -> DispatchResult {
        let ctx = self
            .telemetry
            .start_operation(STORAGE_TRIGGER_OPERATION, None);
        Span::current().record("operation_id", ctx.operation_id());

        match self.correlate(&ctx, blob_url).await {
            Ok(linked) => info!(linked_operation_id = %linked, "correlated blob"),
            Err(e) => warn!(error = %e, "blob carried no usable operation id"),
        }

        let result = workload::run(self.workload_n);
        self.telemetry.flush();
        result
    }

    async fn correlate(&self, ctx: &OperationContext, blob_url: &str) -> Result<String, DispatchError> {
        let location = BlobLocation::from_url(blob_url)?;
        let store = self.storage.blob_store(&location.storage_account).await?;
        let blob = find_blob(store.as_ref(), &location.container, &location.blob_name).await?;
        Ok(recover_and_link(
            &BlobMetadataCarrier,
            &blob.metadata,
            self.telemetry.as_ref(),
            ctx,
        )?)
    }
}

/// Scan `container` for `blob_name`, stopping at the first match. Pages past
/// the match are never fetched.
pub async fn find_blob(
    store: &dyn BlobStore,
    container: &str,
    blob_name: &str,
) -> Result<BlobItem, DispatchError> {
    let mut blobs = store.list_blobs(container);
    while let Some(blob) = blobs.try_next().await? {
        if blob.name == blob_name {
            return Ok(blob);
        }
    }
    Err(DispatchError::BlobNotFound {
        container: container.to_owned(),
        blob_name: blob_name.to_owned(),
    })
}
