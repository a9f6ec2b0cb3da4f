mod benchmark;
mod secrets;
mod server;
mod storage;
mod telemetry;


pub use benchmark::*;
pub use secrets::*;
pub use server::*;
pub use storage::*;
pub use telemetry::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the trigbench server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct TrigbenchConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// `OpenTelemetry` tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Benchmark action and workload tunables.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    /// Storage backend and endpoints.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Credential secret lookup.
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl TrigbenchConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.benchmark.validate()?;
        Ok(config)
    }
}
