//! Storage abstractions the benchmark dispatchers and trigger handlers use.
//!
//! [`StorageConnector`] hands out per-account Blob and Queue stores so the
//! storage account can be chosen per request. [`AzureStorageConnector`] builds
//! them on the Azure Storage SDK clients;
//! [`MemoryStorage`](crate::memory::MemoryStorage) keeps everything in process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use futures::stream::BoxStream;
use tracing::debug;

use crate::auth::{AnonymousCredential, CredentialSource};
use crate::blob::AzureBlobStore;
use crate::config::AzureStorageConfig;
use crate::error::AzureError;
use crate::queue::AzureQueueStore;

/// A listed blob and its user metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobItem {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

/// Blob service of a single storage account.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `body` as a block blob, replacing any existing blob of that name.
    async fn upload_text(
        &self,
        container: &str,
        blob_name: &str,
        body: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), AzureError>;

    /// Lazily enumerate every blob in `container` with its metadata.
    ///
    /// Pages are fetched as the stream is polled; dropping the stream stops
    /// the enumeration.
    fn list_blobs<'a>(&'a self, container: &'a str) -> BoxStream<'a, Result<BlobItem, AzureError>>;
}

/// Queue service of a single storage account.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Enqueue `text` verbatim as the message body.
    async fn send_message(&self, queue: &str, text: &str) -> Result<(), AzureError>;
}

/// Hands out stores for a named storage account.
///
/// Callers fetch a store once per invocation and reuse it for every request
/// of that invocation.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn blob_store(&self, storage_account: &str) -> Result<Arc<dyn BlobStore>, AzureError>;

    async fn queue_store(&self, storage_account: &str) -> Result<Arc<dyn QueueStore>, AzureError>;
}

/// [`StorageConnector`] backed by the Azure Storage SDK.
#[derive(Debug, Clone)]
pub struct AzureStorageConnector {
    config: AzureStorageConfig,
    credentials: Arc<dyn CredentialSource>,
}

impl AzureStorageConnector {
    /// Create a connector. When `config.anonymous` is set, `credentials` is
    /// replaced by [`AnonymousCredential`].
    pub fn new(config: AzureStorageConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        let credentials: Arc<dyn CredentialSource> = if config.anonymous {
            debug!("Azure Storage requests will be sent unauthenticated");
            Arc::new(AnonymousCredential)
        } else {
            credentials
        };
        Self {
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &AzureStorageConfig {
        &self.config
    }

    async fn credential(&self) -> Result<Option<Arc<dyn TokenCredential>>, AzureError> {
        self.credentials.credential().await
    }
}

#[async_trait]
impl StorageConnector for AzureStorageConnector {
    async fn blob_store(&self, storage_account: &str) -> Result<Arc<dyn BlobStore>, AzureError> {
        let endpoint = self.config.blob_endpoint_for(storage_account)?;
        let credential = self.credential().await?;
        Ok(Arc::new(AzureBlobStore::new(
            &endpoint,
            credential,
            self.config.request_timeout(),
        )?))
    }

    async fn queue_store(&self, storage_account: &str) -> Result<Arc<dyn QueueStore>, AzureError> {
        let endpoint = self.config.queue_endpoint_for(storage_account)?;
        let credential = self.credential().await?;
        Ok(Arc::new(AzureQueueStore::new(
            &endpoint,
            credential,
            self.config.request_timeout(),
        )?))
    }
}
