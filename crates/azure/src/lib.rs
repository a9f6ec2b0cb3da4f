//! Azure Storage plumbing for the trigger benchmarks.
//!
//! - **Secrets** ([`SecretStore`]): environment, mounted files, or static
//!   values holding the service-principal credential.
//! - **Auth** ([`CredentialSource`]): a service-principal
//!   [`TokenCredential`](azure_core::credentials::TokenCredential), or none
//!   for anonymous access to emulators.
//! - **Blob** ([`AzureBlobStore`]): block-blob upload with metadata and a
//!   lazily paged container listing on the Blob SDK client.
//! - **Queue** ([`AzureQueueStore`]): Put Message on the Queue SDK client.
//!
//! Stores are handed out per storage account by a [`StorageConnector`]:
//! [`AzureStorageConnector`] for the real service and [`MemoryStorage`] for
//! tests and offline runs.

pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod memory;
pub mod queue;
pub mod secrets;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use auth::{AnonymousCredential, CredentialSource, ServicePrincipalCredential};
pub use blob::AzureBlobStore;
pub use config::{AzureStorageConfig, CredentialSecretNames};
pub use error::{AzureError, SecretError, classify_azure_error};
pub use memory::MemoryStorage;
pub use queue::AzureQueueStore;
pub use secrets::{EnvSecretStore, FileSecretStore, SecretStore, StaticSecretStore};
pub use storage::{AzureStorageConnector, BlobItem, BlobStore, QueueStore, StorageConnector};
