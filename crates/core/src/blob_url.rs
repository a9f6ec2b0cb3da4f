//! Blob location parsing for blob-created events.
//!
//! Event Grid delivers the created blob as a full URL such as
//! `https://acct1.blob.core.windows.net/benchmarks/1700000000000.txt`. The
//! account, container and blob name are recovered positionally: the URL is
//! split on `/`, segments of six characters or fewer (the scheme and the
//! empty segment after it) are discarded, and the first three survivors are
//! host, container and blob.
//!
//! Containers or blobs whose names are six characters or shorter are dropped
//! by that filter as well; the rule matches the blob names produced by the
//! storage benchmark (`<unix-millis>.txt`) and the deployed container name.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::BlobUrlError;

/// Segments at or below this length are discarded.
const SHORT_SEGMENT_LEN: usize = 6;

/// Account, container and blob name derived from a blob URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobLocation {
    pub storage_account: String,
    pub container: String,
    pub blob_name: String,
}

impl BlobLocation {
    pub fn from_url(url: &str) -> Result<Self, BlobUrlError> {
        let segments: Vec<&str> = url
            .split('/')
            .filter(|segment| segment.len() > SHORT_SEGMENT_LEN)
            .collect();

        let [host, container, blob, ..] = segments.as_slice() else {
            return Err(BlobUrlError::TooFewSegments {
                url: url.to_owned(),
                found: segments.len(),
            });
        };

        let storage_account = host
            .split('.')
            .next()
            .filter(|account| !account.is_empty())
            .ok_or_else(|| BlobUrlError::MissingAccount(url.to_owned()))?;

        Ok(Self {
            storage_account: storage_account.to_owned(),
            container: (*container).to_owned(),
            blob_name: percent_decode_str(blob).decode_utf8_lossy().into_owned(),
        })
    }
}
