//! Subscriber setup: `fmt` logs always, plus an OTLP span exporter when the
//! Function App has a collector to send to.

use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Sampler, SdkTracerProvider};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{OtlpProtocol, ResolvedTelemetry, TelemetryConfig};

/// Keeps the tracer provider alive; [`TelemetryGuard::shutdown`] flushes
/// spans still queued for export.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn shutdown(mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            warn!(error = %e, "tracer provider shutdown failed");
        }
    }
}

/// Install the global subscriber. `RUST_LOG` selects the filter (default
/// `info`). A broken exporter downgrades to log-only output instead of
/// keeping the handler from starting.
pub fn init(config: &TelemetryConfig) -> TelemetryGuard {
    let settings = config.resolve();
    let base = || {
        Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(tracing_subscriber::fmt::layer())
    };

    if !settings.enabled {
        base().init();
        report_app_insights(&settings);
        return TelemetryGuard { provider: None };
    }

    let provider = match build_provider(&settings) {
        Ok(provider) => provider,
        Err(e) => {
            base().init();
            tracing::error!(
                error = %e,
                endpoint = %settings.endpoint,
                "OTLP exporter unavailable, logging only"
            );
            return TelemetryGuard { provider: None };
        }
    };

    // Inbound `traceparent` headers become span parents.
    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    base()
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("trigbench")))
        .init();

    info!(
        endpoint = %settings.endpoint,
        protocol = settings.protocol.as_str(),
        service = %settings.service_name,
        sample_ratio = settings.sample_ratio,
        "exporting spans over OTLP"
    );
    report_app_insights(&settings);

    TelemetryGuard {
        provider: Some(provider),
    }
}

/// Application Insights only sees our spans through a collector; say so
/// when the app is wired to one but nothing is exported.
fn report_app_insights(settings: &ResolvedTelemetry) {
    let Some(app_insights) = &settings.app_insights else {
        return;
    };
    if settings.enabled {
        info!(
            ingestion_endpoint = app_insights.ingestion_endpoint.as_deref().unwrap_or("default"),
            "Application Insights configured; spans reach it through the OTLP collector"
        );
    } else {
        warn!(
            "Application Insights is configured for this Function App but no OTLP endpoint is; \
             benchmark spans stay in the logs"
        );
    }
}

fn build_provider(
    settings: &ResolvedTelemetry,
) -> Result<SdkTracerProvider, opentelemetry::trace::TraceError> {
    let exporter = match settings.protocol {
        OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&settings.endpoint)
            .build()?,
        OtlpProtocol::HttpProtobuf => opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(&settings.endpoint)
            .build()?,
    };

    Ok(SdkTracerProvider::builder()
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .with_sampler(sampler(settings.sample_ratio))
        .with_resource(resource(settings))
        .build())
}

/// The SDK's own detectors still apply, so `OTEL_RESOURCE_ATTRIBUTES` is
/// honored on top of these.
fn resource(settings: &ResolvedTelemetry) -> Resource {
    let attributes = [
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("cloud.provider", "azure"),
        KeyValue::new("cloud.platform", "azure_functions"),
    ]
    .into_iter()
    .chain(
        settings
            .resource
            .iter()
            .map(|(key, value)| KeyValue::new(*key, value.clone())),
    );
    Resource::builder()
        .with_service_name(settings.service_name.clone())
        .with_attributes(attributes)
        .build()
}

/// Root invocations are sampled by ratio; joined traces follow the caller's
/// decision.
fn sampler(sample_ratio: f64) -> Sampler {
    let root = if sample_ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if sample_ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(sample_ratio)
    };
    Sampler::ParentBased(Box::new(root))
}
