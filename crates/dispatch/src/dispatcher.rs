//! Outbound benchmark dispatch.
//!
//! One call to [`BenchmarkDispatcher::dispatch`] is one benchmark run: it
//! starts an operation, validates the query, performs a single external
//! action (HTTP GET, blob upload or queue message) carrying the operation id,
//! records the action as a dependency and answers with a text body. The
//! answer is always a 200; success or failure lives in the body.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use tracing::{Span, info, instrument, warn};
use trigbench_azure::StorageConnector;
use trigbench_core::{BenchmarkQuery, BenchmarkRequest, DispatchResult};
use trigbench_correlation::{
    BlobMetadataCarrier, CorrelationCarrier, DependencyTelemetry, HttpHeaderCarrier,
    OperationContext, QueueMessageCarrier, Telemetry,
};

use crate::error::DispatchError;

/// Operation name of a benchmark run.
pub const INFRA_OPERATION: &str = "InfraEndpoint";

/// Dependency type recorded for every benchmark action.
pub const DEPENDENCY_TYPE: &str = "HTTP";

/// Status reported for a storage action the service accepted.
const CREATED: u16 = 201;

/// Tunables of the benchmark actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkSettings {
    /// Upper bound on the HTTP benchmark's GET.
    pub http_timeout: Duration,
    /// Text uploaded by the storage benchmark.
    pub blob_payload: String,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            blob_payload: "Hello world!".to_owned(),
        }
    }
}

/// Runs benchmark requests against HTTP endpoints and Azure Storage.
#[derive(Clone)]
pub struct BenchmarkDispatcher {
    client: reqwest::Client,
    storage: Arc<dyn StorageConnector>,
    telemetry: Arc<dyn Telemetry>,
    settings: BenchmarkSettings,
}

impl std::fmt::Debug for BenchmarkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkDispatcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BenchmarkDispatcher {
    pub fn new(
        storage: Arc<dyn StorageConnector>,
        telemetry: Arc<dyn Telemetry>,
        settings: BenchmarkSettings,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()?;
        Ok(Self {
            client,
            storage,
            telemetry,
            settings,
        })
    }

    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// Run one benchmark. `traceparent` is the inbound W3C header, if any;
    /// the run joins that trace when it is valid.
    #[instrument(
        name = "benchmark.dispatch",
        skip_all,
        fields(trigger = ?query.trigger, operation_id = tracing::field::Empty)
    )]
    pub async fn dispatch(
        &self,
        query: &BenchmarkQuery,
        traceparent: Option<&str>,
    ) -> DispatchResult {
        let ctx = self.telemetry.start_operation(INFRA_OPERATION, traceparent);
        Span::current().record("operation_id", ctx.operation_id());

        let result = match BenchmarkRequest::parse(query) {
            Ok(request) => self.run(&ctx, &request).await,
            Err(e) => {
                warn!(error = %e, "rejected benchmark query");
                DispatchResult::invalid_parameters()
            }
        };
        self.telemetry.flush();
        result
    }

    async fn run(&self, ctx: &OperationContext, request: &BenchmarkRequest) -> DispatchResult {
        let kind = request.kind();
        let started = Instant::now();
        let outcome = match request {
            BenchmarkRequest::Http { url } => self.http_benchmark(ctx, url).await,
            BenchmarkRequest::Storage {
                container,
                storage_account,
            } => self.storage_benchmark(ctx, storage_account, container).await,
            BenchmarkRequest::Queue {
                queue,
                storage_account,
            } => self.queue_benchmark(ctx, storage_account, queue).await,
        };
        let duration = started.elapsed();

        let (result_code, success) = match &outcome {
            Ok(status) => (*status, true),
            Err(e) => (e.status_code().unwrap_or(0), false),
        };
        self.telemetry.track_dependency(
            ctx,
            DependencyTelemetry {
                type_name: DEPENDENCY_TYPE.to_owned(),
                target: request.target(),
                result_code,
                success,
                duration,
                id: ctx.parent_id().to_owned(),
            },
        );

        match outcome {
            Ok(_) => {
                info!(trigger = %kind, target = %request.target(), "benchmark started");
                DispatchResult::started(kind)
            }
            Err(e) => {
                warn!(trigger = %kind, target = %request.target(), error = %e, "benchmark failed to start");
                let mut message = e.to_string();
                if let BenchmarkRequest::Queue { queue, .. } = request {
                    message.push_str(" \n Queue: ");
                    message.push_str(queue);
                }
                DispatchResult::failed_to_start(kind, &message)
            }
        }
    }

    /// GET `url` once with the operation id in `traceparent`.
    async fn http_benchmark(&self, ctx: &OperationContext, url: &str) -> Result<u16, DispatchError> {
        let mut headers = HeaderMap::new();
        HttpHeaderCarrier.emit(ctx, &mut headers);

        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status().as_u16();
        response.error_for_status()?;
        Ok(status)
    }

    /// Upload `<unix-millis>.txt` tagged with the operation id.
    #[instrument(skip(self, ctx))]
    async fn storage_benchmark(
        &self,
        ctx: &OperationContext,
        storage_account: &str,
        container: &str,
    ) -> Result<u16, DispatchError> {
        let store = self.storage.blob_store(storage_account).await?;
        let blob_name = benchmark_blob_name();

        let mut metadata = HashMap::new();
        BlobMetadataCarrier.emit(ctx, &mut metadata);

        store
            .upload_text(container, &blob_name, &self.settings.blob_payload, &metadata)
            .await?;
        info!(blob_name = %blob_name, "benchmark blob uploaded");
        Ok(CREATED)
    }

    /// Send the base64 operation id as the message text.
    #[instrument(skip(self, ctx))]
    async fn queue_benchmark(
        &self,
        ctx: &OperationContext,
        storage_account: &str,
        queue: &str,
    ) -> Result<u16, DispatchError> {
        let store = self.storage.queue_store(storage_account).await?;

        let mut message = String::new();
        QueueMessageCarrier.emit(ctx, &mut message);

        store.send_message(queue, &message).await?;
        Ok(CREATED)
    }
}

/// Blob name of a storage benchmark upload: the current Unix time in
/// milliseconds with a `.txt` extension.
pub fn benchmark_blob_name() -> String {
    format!("{}.txt", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use trigbench_azure::MemoryStorage;
    use trigbench_core::INVALID_PARAMETERS_BODY;
    use trigbench_correlation::{MemoryTelemetry, OPERATION_ID_METADATA_KEY};

    use super::*;
    use crate::test_support::MockHttpServer;

    struct Harness {
        dispatcher: BenchmarkDispatcher,
        storage: MemoryStorage,
        telemetry: Arc<MemoryTelemetry>,
    }

    fn harness() -> Harness {
        let storage = MemoryStorage::new();
        let telemetry = Arc::new(MemoryTelemetry::new());
        let dispatcher = BenchmarkDispatcher::new(
            Arc::new(storage.clone()),
            telemetry.clone(),
            BenchmarkSettings {
                http_timeout: Duration::from_secs(5),
                ..BenchmarkSettings::default()
            },
        )
        .unwrap();
        Harness {
            dispatcher,
            storage,
            telemetry,
        }
    }

    fn current_operation_id(telemetry: &MemoryTelemetry) -> String {
        telemetry.last_operation().unwrap().operation_id().to_owned()
    }

    #[tokio::test]
    async fn invalid_queries_get_fixed_message() {
        let h = harness();
        let queries = [
            BenchmarkQuery::default(),
            BenchmarkQuery {
                trigger: None,
                input: Some("jobs,acct1".into()),
            },
            BenchmarkQuery {
                trigger: Some("queue".into()),
                input: None,
            },
            BenchmarkQuery::new("ftp", "x"),
            BenchmarkQuery::new("queue", "jobs"),
            BenchmarkQuery::new("storage", "uploads,acct1,extra"),
        ];
        for query in &queries {
            let result = h.dispatcher.dispatch(query, None).await;
            assert_eq!(result.status_code, 200, "{query:?}");
            assert_eq!(result.body, INVALID_PARAMETERS_BODY, "{query:?}");
        }
        assert!(h.telemetry.dependencies().is_empty());
        assert_eq!(h.telemetry.operations().len(), queries.len());
    }

    #[tokio::test]
    async fn queue_benchmark_sends_base64_operation_id() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("queue", "jobs,acct1"), None)
            .await;

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, "AZURE - Queue trigger benchmark successfully started");
        assert_eq!(result.content_type(), Some("text/plain"));

        let op_id = current_operation_id(&h.telemetry);
        assert_eq!(h.storage.messages("acct1", "jobs"), [STANDARD.encode(&op_id)]);

        let deps = h.telemetry.dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].type_name, "HTTP");
        assert_eq!(deps[0].target, "acct1/jobs");
        assert!(deps[0].success);
        assert_eq!(h.telemetry.flush_count(), 1);
    }

    #[tokio::test]
    async fn storage_benchmark_uploads_one_tagged_blob() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("storage", "uploads,acct1"), None)
            .await;

        assert_eq!(
            result.body,
            "AZURE - Storage trigger benchmark successfully started"
        );
        let blobs = h.storage.blobs("acct1", "uploads");
        assert_eq!(blobs.len(), 1);
        assert!(blobs[0].name.ends_with(".txt"));
        assert!(
            blobs[0].name.trim_end_matches(".txt").parse::<i64>().is_ok(),
            "{}",
            blobs[0].name
        );
        assert_eq!(
            blobs[0].metadata[OPERATION_ID_METADATA_KEY],
            current_operation_id(&h.telemetry)
        );
    }

    #[tokio::test]
    async fn storage_failure_is_reported_in_body() {
        let h = harness();
        h.storage.fail_with("ContainerNotFound");
        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("storage", "uploads,acct1"), None)
            .await;

        assert_eq!(result.status_code, 200);
        assert_eq!(
            result.body,
            "AZURE - Storage trigger benchmark failed to start\n\n\
             Error: Azure service error (500): ContainerNotFound"
        );
        let deps = h.telemetry.dependencies();
        assert!(!deps[0].success);
        assert_eq!(deps[0].result_code, 500);
    }

    #[tokio::test]
    async fn queue_failure_names_the_queue() {
        let h = harness();
        h.storage.fail_with("QueueNotFound");
        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("queue", "jobs,acct1"), None)
            .await;

        assert!(result.body.contains("failed to start"));
        assert!(result.body.contains("QueueNotFound"));
        assert!(result.body.ends_with(" \n Queue: jobs"));
    }

    #[tokio::test]
    async fn invalid_account_fails_without_touching_storage() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("queue", "jobs,Not.An.Account"), None)
            .await;
        assert!(result.body.starts_with("AZURE - Queue trigger benchmark failed to start"));
        assert!(result.body.contains("invalid storage account name"));
    }

    #[tokio::test]
    async fn http_benchmark_carries_traceparent() {
        let h = harness();
        let server = MockHttpServer::start().await;
        let url = format!("{}/api/HttpTrigger", server.base_url);
        let handle = tokio::spawn(server.respond_once(200, "20! = 2432902008176640000"));

        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("http", url.clone()), None)
            .await;
        let request = handle.await.unwrap();

        assert_eq!(result.body, "AZURE - HTTP trigger successfully started");
        let op_id = current_operation_id(&h.telemetry);
        let traceparent = crate::test_support::header(&request, "traceparent").unwrap();
        assert!(traceparent.starts_with(&format!("00-{op_id}-")), "{traceparent}");

        let deps = h.telemetry.dependencies();
        assert_eq!(deps[0].target, url);
        assert_eq!(deps[0].result_code, 200);
        assert!(deps[0].success);
    }

    #[tokio::test]
    async fn http_error_status_fails_to_start() {
        let h = harness();
        let server = MockHttpServer::start().await;
        let url = format!("{}/missing", server.base_url);
        let handle = tokio::spawn(server.respond_once(404, "nope"));

        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("http", url), None)
            .await;
        handle.await.unwrap();

        assert_eq!(result.status_code, 200);
        assert!(
            result
                .body
                .starts_with("AZURE - HTTP trigger benchmark failed to start\n\nError: ")
        );
        assert!(result.body.contains("404"));
        assert_eq!(h.telemetry.dependencies()[0].result_code, 404);
    }

    #[tokio::test]
    async fn http_unreachable_fails_to_start() {
        let h = harness();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = h
            .dispatcher
            .dispatch(&BenchmarkQuery::new("http", format!("http://127.0.0.1:{port}/")), None)
            .await;

        assert!(result.body.contains("failed to start"));
        let deps = h.telemetry.dependencies();
        assert_eq!(deps[0].result_code, 0);
        assert!(!deps[0].success);
    }

    #[tokio::test]
    async fn inbound_traceparent_is_joined() {
        let h = harness();
        h.dispatcher
            .dispatch(
                &BenchmarkQuery::new("queue", "jobs,acct1"),
                Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
            )
            .await;

        let ctx = h.telemetry.last_operation().unwrap();
        assert_eq!(ctx.operation_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.parent_id(), "00f067aa0ba902b7");
        assert_eq!(h.telemetry.dependencies()[0].id, "00f067aa0ba902b7");
    }

    #[test]
    fn blob_name_is_unix_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let name = benchmark_blob_name();
        let millis: i64 = name.strip_suffix(".txt").unwrap().parse().unwrap();
        assert!(millis >= before);
    }
}
