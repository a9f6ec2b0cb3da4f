use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AzureError;

/// Placeholder replaced by the storage account name in endpoint templates.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Names under which the service-principal credential is looked up in the
/// configured secret store. Only the names live in configuration; the values
/// are resolved at invocation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSecretNames {
    #[serde(default = "default_tenant_id_name")]
    pub tenant_id: String,

    #[serde(default = "default_client_id_name")]
    pub client_id: String,

    #[serde(default = "default_client_secret_name")]
    pub client_secret: String,
}

impl Default for CredentialSecretNames {
    fn default() -> Self {
        Self {
            tenant_id: default_tenant_id_name(),
            client_id: default_client_id_name(),
            client_secret: default_client_secret_name(),
        }
    }
}

fn default_tenant_id_name() -> String {
    "AZURE_TENANT_ID".to_owned()
}

fn default_client_id_name() -> String {
    "AZURE_CLIENT_ID".to_owned()
}

fn default_client_secret_name() -> String {
    "AZURE_CLIENT_SECRET".to_owned()
}

/// Connection settings for Azure Storage.
///
/// Endpoints are templates: `{account}` is replaced by the storage account
/// named in each benchmark request, so one process can target any account.
/// Point both templates at `Azurite` (for example
/// `http://127.0.0.1:10000/{account}`) for local development.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureStorageConfig {
    #[serde(default = "default_blob_endpoint")]
    pub blob_endpoint: String,

    #[serde(default = "default_queue_endpoint")]
    pub queue_endpoint: String,

    /// Per-request timeout for Storage calls.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Skip authentication entirely (public containers, emulators).
    #[serde(default)]
    pub anonymous: bool,
}

fn default_blob_endpoint() -> String {
    "https://{account}.blob.core.windows.net".to_owned()
}

fn default_queue_endpoint() -> String {
    "https://{account}.queue.core.windows.net".to_owned()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for AzureStorageConfig {
    fn default() -> Self {
        Self {
            blob_endpoint: default_blob_endpoint(),
            queue_endpoint: default_queue_endpoint(),
            request_timeout_seconds: default_request_timeout_seconds(),
            anonymous: false,
        }
    }
}

impl AzureStorageConfig {
    /// Set the Blob service endpoint template.
    #[must_use]
    pub fn with_blob_endpoint(mut self, template: impl Into<String>) -> Self {
        self.blob_endpoint = template.into();
        self
    }

    /// Set the Queue service endpoint template.
    #[must_use]
    pub fn with_queue_endpoint(mut self, template: impl Into<String>) -> Self {
        self.queue_endpoint = template.into();
        self
    }

    #[must_use]
    pub fn with_anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Blob service base URL for `account`.
    pub fn blob_endpoint_for(&self, account: &str) -> Result<String, AzureError> {
        render_endpoint(&self.blob_endpoint, account)
    }

    /// Queue service base URL for `account`.
    pub fn queue_endpoint_for(&self, account: &str) -> Result<String, AzureError> {
        render_endpoint(&self.queue_endpoint, account)
    }
}

/// Storage account names are 3 to 24 lowercase letters and digits. Anything
/// else would let request input rewrite the endpoint host.
pub fn validate_account_name(account: &str) -> Result<(), AzureError> {
    let valid = (3..=24).contains(&account.len())
        && account
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AzureError::Configuration(format!(
            "invalid storage account name: {account:?}"
        )))
    }
}

fn render_endpoint(template: &str, account: &str) -> Result<String, AzureError> {
    validate_account_name(account)?;
    if !template.contains(ACCOUNT_PLACEHOLDER) {
        return Err(AzureError::Configuration(format!(
            "endpoint template {template:?} has no {ACCOUNT_PLACEHOLDER} placeholder"
        )));
    }
    Ok(template
        .replace(ACCOUNT_PLACEHOLDER, account)
        .trim_end_matches('/')
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_target_public_cloud() {
        let config = AzureStorageConfig::default();
        assert_eq!(
            config.blob_endpoint_for("acct1").unwrap(),
            "https://acct1.blob.core.windows.net"
        );
        assert_eq!(
            config.queue_endpoint_for("acct1").unwrap(),
            "https://acct1.queue.core.windows.net"
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.anonymous);
    }

    #[test]
    fn emulator_style_template() {
        let config =
            AzureStorageConfig::default().with_blob_endpoint("http://127.0.0.1:10000/{account}/");
        assert_eq!(
            config.blob_endpoint_for("devstoreaccount1").unwrap(),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let config = AzureStorageConfig::default().with_queue_endpoint("https://fixed.example");
        let err = config.queue_endpoint_for("acct1").unwrap_err();
        assert!(matches!(err, AzureError::Configuration(_)));
    }

    #[test]
    fn account_names_are_validated() {
        assert!(validate_account_name("acct1").is_ok());
        assert!(validate_account_name("ab").is_err());
        assert!(validate_account_name("Acct1").is_err());
        assert!(validate_account_name("evil.example.com/x").is_err());
        assert!(validate_account_name(&"a".repeat(25)).is_err());
    }

    #[test]
    fn deserializes_partial_toml() {
        let config: AzureStorageConfig = toml::from_str("anonymous = true").unwrap();
        assert!(config.anonymous);
        assert_eq!(config.blob_endpoint, default_blob_endpoint());
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn secret_names_default_to_azure_sdk_variables() {
        let names: CredentialSecretNames = toml::from_str(r#"client_secret = "SP_SECRET""#).unwrap();
        assert_eq!(names.tenant_id, "AZURE_TENANT_ID");
        assert_eq!(names.client_id, "AZURE_CLIENT_ID");
        assert_eq!(names.client_secret, "SP_SECRET");
    }
}
