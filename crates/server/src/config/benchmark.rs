use std::time::Duration;

use serde::Deserialize;
use trigbench_core::{DEFAULT_WORKLOAD_N, MAX_WORKLOAD_N};
use trigbench_dispatch::BenchmarkSettings;

use crate::error::ServerError;

/// Benchmark action and workload tunables.
#[derive(Debug, Deserialize)]
pub struct BenchmarkConfig {
    /// Timeout of the HTTP benchmark's GET.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Text uploaded by the storage benchmark.
    #[serde(default = "default_blob_payload")]
    pub blob_payload: String,
    /// `n` of the factorial workload run by the trigger handlers.
    #[serde(default = "default_workload_n")]
    pub workload_n: u32,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: default_http_timeout(),
            blob_payload: default_blob_payload(),
            workload_n: default_workload_n(),
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workload_n > MAX_WORKLOAD_N {
            return Err(ServerError::Config(format!(
                "benchmark.workload_n must be at most {MAX_WORKLOAD_N}, got {}",
                self.workload_n
            )));
        }
        if self.http_timeout_seconds == 0 {
            return Err(ServerError::Config(
                "benchmark.http_timeout_seconds must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn settings(&self) -> BenchmarkSettings {
        BenchmarkSettings {
            http_timeout: Duration::from_secs(self.http_timeout_seconds),
            blob_payload: self.blob_payload.clone(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_blob_payload() -> String {
    "Hello world!".to_owned()
}

fn default_workload_n() -> u32 {
    DEFAULT_WORKLOAD_N
}
