use thiserror::Error;
use trigbench_azure::AzureError;
use trigbench_core::BlobUrlError;
use trigbench_correlation::CorrelationError;

/// Why a benchmark action or an inbound correlation lookup failed.
///
/// None of these escape a dispatcher or handler: they end up as the
/// `Error:` text of a failure body or as a logged warning.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The outbound HTTP GET failed or returned a non-success status.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] AzureError),

    #[error(transparent)]
    BlobUrl(#[from] BlobUrlError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    /// The blob named by a blob-created event is not in its container.
    #[error("blob {blob_name} not found in container {container}")]
    BlobNotFound { container: String, blob_name: String },
}

impl DispatchError {
    /// Status code returned by the remote side, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Storage(e) => e.status(),
            _ => None,
        }
    }
}
