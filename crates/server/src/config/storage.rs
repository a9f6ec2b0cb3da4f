use serde::Deserialize;
use trigbench_azure::AzureStorageConfig;

/// Which storage implementation backs the Storage and Queue benchmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Azure Storage through the SDK clients.
    #[default]
    Azure,
    /// In-process storage; nothing leaves the process.
    Memory,
}

/// Storage configuration.
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "azure"
/// blob_endpoint = "http://127.0.0.1:10000/{account}"
/// queue_endpoint = "http://127.0.0.1:10001/{account}"
/// anonymous = true
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Endpoint templates, timeout and authentication mode.
    #[serde(flatten)]
    pub azure: AzureStorageConfig,
}
