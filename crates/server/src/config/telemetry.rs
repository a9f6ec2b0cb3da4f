use serde::Deserialize;

/// Standard OTLP exporter endpoint variable; the Functions host sets it when
/// an OpenTelemetry collector is attached to the app.
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
pub const OTLP_PROTOCOL_ENV: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
pub const APPINSIGHTS_CONNECTION_STRING_ENV: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";
/// Instrumentation-key only setting of older Function Apps.
pub const APPINSIGHTS_KEY_ENV: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";
pub const SITE_NAME_ENV: &str = "WEBSITE_SITE_NAME";
pub const REGION_ENV: &str = "REGION_NAME";
pub const INSTANCE_ID_ENV: &str = "WEBSITE_INSTANCE_ID";

const DEFAULT_ENDPOINT: &str = "http://localhost:4317";
const DEFAULT_SERVICE_NAME: &str = "trigbench";

/// OTLP transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum OtlpProtocol {
    #[default]
    #[serde(rename = "grpc")]
    Grpc,
    #[serde(rename = "http/protobuf", alias = "http")]
    HttpProtobuf,
}

impl OtlpProtocol {
    /// Parse the `OTEL_EXPORTER_OTLP_PROTOCOL` spelling.
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim() {
            "grpc" => Some(Self::Grpc),
            "http/protobuf" | "http" => Some(Self::HttpProtobuf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::HttpProtobuf => "http/protobuf",
        }
    }
}

/// `[telemetry]` section. Every field left out falls back to the Function
/// App's environment, so a deployment with a collector attached needs no
/// configuration at all.
///
/// # Example
///
/// ```toml
/// [telemetry]
/// enabled = true
/// endpoint = "http://otel-collector:4317"
/// sample_ratio = 0.25
/// ```
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    /// Export spans over OTLP. Unset means "when an OTLP endpoint is in the
    /// environment".
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Defaults to `OTEL_EXPORTER_OTLP_ENDPOINT`, then `http://localhost:4317`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Defaults to `OTEL_EXPORTER_OTLP_PROTOCOL`, then gRPC.
    #[serde(default)]
    pub protocol: Option<OtlpProtocol>,
    /// Defaults to the Function App name (`WEBSITE_SITE_NAME`).
    #[serde(default)]
    pub service_name: Option<String>,
    /// Fraction of root invocations sampled; `1.0` traces every one.
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            endpoint: None,
            protocol: None,
            service_name: None,
            sample_ratio: default_sample_ratio(),
        }
    }
}

fn default_sample_ratio() -> f64 {
    1.0
}

/// Application Insights resource the Function App reports to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInsights {
    pub instrumentation_key: String,
    pub ingestion_endpoint: Option<String>,
}

impl AppInsights {
    /// Parse a `Key=Value;Key=Value` connection string. Keys are matched
    /// case-insensitively; a string without `InstrumentationKey` is ignored.
    pub fn from_connection_string(value: &str) -> Option<Self> {
        let mut instrumentation_key = None;
        let mut ingestion_endpoint = None;
        for pair in value.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key.trim().eq_ignore_ascii_case("InstrumentationKey") {
                instrumentation_key = Some(value.to_owned());
            } else if key.trim().eq_ignore_ascii_case("IngestionEndpoint") {
                ingestion_endpoint = Some(value.to_owned());
            }
        }
        Some(Self {
            instrumentation_key: instrumentation_key?,
            ingestion_endpoint,
        })
    }
}

/// Telemetry settings after environment fallbacks are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTelemetry {
    pub enabled: bool,
    pub endpoint: String,
    pub protocol: OtlpProtocol,
    pub service_name: String,
    pub sample_ratio: f64,
    /// Resource attributes describing the hosting Function App.
    pub resource: Vec<(&'static str, String)>,
    pub app_insights: Option<AppInsights>,
}

impl TelemetryConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> ResolvedTelemetry {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve against `env`, which returns a variable's value if set.
    pub fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> ResolvedTelemetry {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let env_endpoint = env(OTLP_ENDPOINT_ENV);

        let resource = [
            ("faas.name", SITE_NAME_ENV),
            ("cloud.region", REGION_ENV),
            ("faas.instance", INSTANCE_ID_ENV),
        ]
        .into_iter()
        .filter_map(|(attribute, var)| env(var).map(|value| (attribute, value)))
        .collect();

        let app_insights = env(APPINSIGHTS_CONNECTION_STRING_ENV)
            .and_then(|s| AppInsights::from_connection_string(&s))
            .or_else(|| {
                env(APPINSIGHTS_KEY_ENV).map(|key| AppInsights {
                    instrumentation_key: key,
                    ingestion_endpoint: None,
                })
            });

        ResolvedTelemetry {
            enabled: self.enabled.unwrap_or(env_endpoint.is_some()),
            endpoint: self
                .endpoint
                .clone()
                .or(env_endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            protocol: self
                .protocol
                .or_else(|| env(OTLP_PROTOCOL_ENV).and_then(|p| OtlpProtocol::from_env_value(&p)))
                .unwrap_or_default(),
            service_name: self
                .service_name
                .clone()
                .or_else(|| env(SITE_NAME_ENV))
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned()),
            sample_ratio: self.sample_ratio,
            resource,
            app_insights,
        }
    }
}
