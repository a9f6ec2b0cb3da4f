use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use trigbench_azure::{CredentialSecretNames, EnvSecretStore, FileSecretStore, SecretStore};

/// Where credential secrets are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
    /// Process environment variables.
    #[default]
    Env,
    /// One file per secret in `directory`.
    File,
}

/// Secret store configuration. Only secret *names* are configured here; the
/// values are looked up on every benchmark invocation.
#[derive(Debug, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub source: SecretSource,
    /// Prefix prepended to each name when reading environment variables.
    #[serde(default)]
    pub prefix: String,
    /// Directory holding one file per secret.
    #[serde(default = "default_secrets_directory")]
    pub directory: PathBuf,
    #[serde(flatten)]
    pub names: CredentialSecretNames,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            source: SecretSource::default(),
            prefix: String::new(),
            directory: default_secrets_directory(),
            names: CredentialSecretNames::default(),
        }
    }
}

impl SecretsConfig {
    pub fn build_store(&self) -> Arc<dyn SecretStore> {
        match self.source {
            SecretSource::Env => Arc::new(EnvSecretStore::new(self.prefix.clone())),
            SecretSource::File => Arc::new(FileSecretStore::new(self.directory.clone())),
        }
    }
}

fn default_secrets_directory() -> PathBuf {
    PathBuf::from("/run/secrets")
}
