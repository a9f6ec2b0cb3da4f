//! Secret stores backing the service-principal credential.
//!
//! Secrets are resolved on every invocation, never cached in configuration,
//! so a rotated value is picked up by the next benchmark without a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use crate::error::SecretError;

/// Resolves secret values by name.
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError>;
}

/// Reads secrets from process environment variables, optionally prefixed.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn variable(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        let variable = self.variable(name);
        match std::env::var(&variable) {
            Ok(value) if !value.is_empty() => Ok(SecretString::new(value)),
            _ => Err(SecretError::NotFound(variable)),
        }
    }
}

/// Reads each secret from a file named after it inside a directory, the
/// layout produced by mounted Kubernetes secrets and Key Vault CSI volumes.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    directory: PathBuf,
}

impl FileSecretStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(SecretError::InvalidName(name.to_owned()));
        }
        let path = self.directory.join(name);
        debug!(path = %path.display(), "reading secret file");
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let value = contents.trim_end_matches(['\r', '\n']);
                if value.is_empty() {
                    Err(SecretError::NotFound(name.to_owned()))
                } else {
                    Ok(SecretString::new(value.to_owned()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound(name.to_owned()))
            }
            Err(source) => Err(SecretError::Io {
                name: name.to_owned(),
                source,
            }),
        }
    }
}

/// Fixed in-memory secrets, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, SecretString>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets
            .insert(name.into(), SecretString::new(value.into()));
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_owned()))
    }
}
