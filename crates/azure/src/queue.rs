use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_storage_queue::QueueServiceClient;
use azure_storage_queue::models::QueueMessage;
use tracing::{debug, instrument};

use crate::error::AzureError;
use crate::storage::QueueStore;

/// Queue service of one storage account, on the Azure SDK client.
pub struct AzureQueueStore {
    service: QueueServiceClient,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for AzureQueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureQueueStore")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AzureQueueStore {
    pub fn new(
        endpoint: &str,
        credential: Option<Arc<dyn TokenCredential>>,
        timeout: Duration,
    ) -> Result<Self, AzureError> {
        let service = QueueServiceClient::new(endpoint, credential, None)
            .map_err(|e| AzureError::Configuration(format!("queue client error: {e}")))?;
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

/// Put Message body. The text goes out as is; any encoding is the caller's
/// business.
fn message_body(text: &str) -> Result<azure_core::Bytes, AzureError> {
    let message = QueueMessage {
        message_text: Some(text.to_owned()),
    };
    Ok(azure_core::xml::to_xml_with_root("QueueMessage", &message)?)
}

#[async_trait]
impl QueueStore for AzureQueueStore {
    #[instrument(skip(self, text), fields(endpoint = %self.endpoint))]
    async fn send_message(&self, queue: &str, text: &str) -> Result<(), AzureError> {
        let body = message_body(text)?;
        let queue_client = self.service.queue_client(queue)?;
        tokio::time::timeout(self.timeout, queue_client.send_message(body.into(), None))
            .await
            .map_err(|_| AzureError::Timeout)??;

        debug!("queue message sent");
        Ok(())
    }
}
