use std::sync::Arc;

use tracing::info;
use trigbench_azure::{
    AzureStorageConnector, MemoryStorage, ServicePrincipalCredential, StorageConnector,
};

use crate::config::{SecretsConfig, StorageBackend, StorageConfig};

/// Create the storage connector selected by `[storage] backend`.
///
/// Nothing is resolved here: the Azure backend reads its credential secrets
/// when a benchmark asks for a store.
pub fn create_storage(storage: &StorageConfig, secrets: &SecretsConfig) -> Arc<dyn StorageConnector> {
    match storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory storage backend");
            Arc::new(MemoryStorage::new())
        }
        StorageBackend::Azure => {
            let credentials =
                ServicePrincipalCredential::new(secrets.build_store(), secrets.names.clone());
            info!(
                blob_endpoint = %storage.azure.blob_endpoint,
                queue_endpoint = %storage.azure.queue_endpoint,
                anonymous = storage.azure.anonymous,
                secret_source = ?secrets.source,
                "using Azure Storage backend"
            );
            Arc::new(AzureStorageConnector::new(
                storage.azure.clone(),
                Arc::new(credentials),
            ))
        }
    }
}
