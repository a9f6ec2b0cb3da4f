use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_storage_blob::BlobServiceClient;
use azure_storage_blob::models::{
    BlobContainerClientListBlobsOptions, BlobItemInternal, BlockBlobClientUploadOptions,
    ListBlobsIncludeItem,
};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::error::AzureError;
use crate::storage::{BlobItem, BlobStore};

/// Blob service of one storage account, on the Azure SDK client.
pub struct AzureBlobStore {
    service: BlobServiceClient,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// `endpoint` is the account's Blob service URL. Without a credential
    /// requests are sent unauthenticated.
    pub fn new(
        endpoint: &str,
        credential: Option<Arc<dyn TokenCredential>>,
        timeout: Duration,
    ) -> Result<Self, AzureError> {
        let service = BlobServiceClient::new(endpoint, credential, None)
            .map_err(|e| AzureError::Configuration(format!("blob client error: {e}")))?;
        Ok(Self {
            service,
            endpoint: endpoint.to_owned(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[instrument(skip(self, body, metadata), fields(endpoint = %self.endpoint))]
    async fn upload_text(
        &self,
        container: &str,
        blob_name: &str,
        body: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), AzureError> {
        for (key, value) in metadata {
            validate_metadata(key, value)?;
        }

        let content_length = body.len() as u64;
        let data: azure_core::Bytes = body.as_bytes().to_vec().into();
        let options = BlockBlobClientUploadOptions {
            metadata: Some(metadata.clone()),
            ..Default::default()
        };

        let blob_client = self.service.blob_client(container, blob_name);
        tokio::time::timeout(
            self.timeout,
            blob_client.upload(data.into(), true, content_length, Some(options)),
        )
        .await
        .map_err(|_| AzureError::Timeout)??;

        debug!(size = content_length, "blob uploaded");
        Ok(())
    }

    fn list_blobs<'a>(&'a self, container: &'a str) -> BoxStream<'a, Result<BlobItem, AzureError>> {
        let options = BlobContainerClientListBlobsOptions {
            include: Some(vec![ListBlobsIncludeItem::Metadata]),
            ..Default::default()
        };
        let pages = match self
            .service
            .blob_container_client(container)
            .list_blobs(Some(options))
        {
            Ok(pages) => Box::pin(pages),
            Err(e) => return stream::once(async move { Err(AzureError::from(e)) }).boxed(),
        };

        let timeout = self.timeout;
        stream::try_unfold(pages, move |mut pages| async move {
            let Some(page) = tokio::time::timeout(timeout, pages.next())
                .await
                .map_err(|_| AzureError::Timeout)?
            else {
                return Ok(None);
            };
            let segment = page?.into_model()?;
            let items: Vec<Result<BlobItem, AzureError>> = segment
                .segment
                .blob_items
                .into_iter()
                .filter_map(blob_item)
                .map(Ok)
                .collect();
            debug!(container, blobs = items.len(), "listed blob page");
            Ok::<_, AzureError>(Some((stream::iter(items), pages)))
        })
        .try_flatten()
        .boxed()
    }
}

fn blob_item(item: BlobItemInternal) -> Option<BlobItem> {
    let name = item.name.and_then(|name| name.content)?;
    Some(BlobItem {
        name,
        metadata: item.metadata.unwrap_or_default(),
    })
}

/// Metadata names must be valid C# identifiers and values plain ASCII for the
/// service to accept them as headers.
fn validate_metadata(key: &str, value: &str) -> Result<(), AzureError> {
    let key_ok = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let value_ok = value.chars().all(|c| c.is_ascii() && !c.is_ascii_control());
    if key_ok && value_ok {
        Ok(())
    } else {
        Err(AzureError::Configuration(format!(
            "invalid blob metadata entry {key:?}"
        )))
    }
}
