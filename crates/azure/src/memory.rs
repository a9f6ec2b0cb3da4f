use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::config::validate_account_name;
use crate::error::AzureError;
use crate::storage::{BlobItem, BlobStore, QueueStore, StorageConnector};

type Key = (String, String);

#[derive(Debug, Default)]
struct MemoryState {
    /// Blobs per `(account, container)`, in upload order.
    blobs: BTreeMap<Key, Vec<BlobItem>>,
    /// Messages per `(account, queue)`, in send order.
    messages: BTreeMap<Key, Vec<String>>,
    /// When set, every store operation fails with this service message.
    failure: Option<String>,
}

/// In-process [`StorageConnector`]. Containers and queues spring into
/// existence on first use.
///
/// Cloning shares the underlying state, so a test can keep a handle to
/// inspect what a dispatcher wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }

    /// Make every subsequent operation fail with a 500 carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    /// Seed a blob directly, bypassing any injected failure.
    pub fn insert_blob(
        &self,
        account: &str,
        container: &str,
        name: &str,
        metadata: HashMap<String, String>,
    ) {
        self.lock()
            .blobs
            .entry((account.to_owned(), container.to_owned()))
            .or_default()
            .push(BlobItem {
                name: name.to_owned(),
                metadata,
            });
    }

    /// Blobs stored in `account/container`, in upload order.
    pub fn blobs(&self, account: &str, container: &str) -> Vec<BlobItem> {
        self.lock()
            .blobs
            .get(&(account.to_owned(), container.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    /// Messages sent to `account/queue`, in send order.
    pub fn messages(&self, account: &str, queue: &str) -> Vec<String> {
        self.lock()
            .messages
            .get(&(account.to_owned(), queue.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    fn account(&self, account: &str) -> Result<Arc<MemoryAccount>, AzureError> {
        validate_account_name(account)?;
        Ok(Arc::new(MemoryAccount {
            account: account.to_owned(),
            state: Arc::clone(&self.state),
        }))
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl StorageConnector for MemoryStorage {
    async fn blob_store(&self, storage_account: &str) -> Result<Arc<dyn BlobStore>, AzureError> {
        Ok(self.account(storage_account)?)
    }

    async fn queue_store(&self, storage_account: &str) -> Result<Arc<dyn QueueStore>, AzureError> {
        Ok(self.account(storage_account)?)
    }
}

/// View of [`MemoryStorage`] scoped to one account.
#[derive(Debug)]
struct MemoryAccount {
    account: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAccount {
    fn key(&self, name: &str) -> Key {
        (self.account.clone(), name.to_owned())
    }

    fn check(state: &MemoryState) -> Result<(), AzureError> {
        match &state.failure {
            Some(message) => Err(AzureError::Service {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryAccount {
    async fn upload_text(
        &self,
        container: &str,
        blob_name: &str,
        _body: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), AzureError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        let blobs = state.blobs.entry(self.key(container)).or_default();
        blobs.retain(|b| b.name != blob_name);
        blobs.push(BlobItem {
            name: blob_name.to_owned(),
            metadata: metadata.clone(),
        });
        Ok(())
    }

    fn list_blobs<'a>(&'a self, container: &'a str) -> BoxStream<'a, Result<BlobItem, AzureError>> {
        let state = lock(&self.state);
        if let Err(e) = Self::check(&state) {
            return stream::once(async move { Err(e) }).boxed();
        }
        let snapshot = state
            .blobs
            .get(&self.key(container))
            .cloned()
            .unwrap_or_default();
        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }
}

#[async_trait]
impl QueueStore for MemoryAccount {
    async fn send_message(&self, queue: &str, text: &str) -> Result<(), AzureError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        state
            .messages
            .entry(self.key(queue))
            .or_default()
            .push(text.to_owned());
        Ok(())
    }
}
