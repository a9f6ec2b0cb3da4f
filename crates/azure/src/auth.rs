use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::{Secret, TokenCredential};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::CredentialSecretNames;
use crate::error::AzureError;
use crate::secrets::SecretStore;

/// Supplies the credential the Storage SDK clients authenticate with.
///
/// Called once per store, so every request a store makes (including every
/// page of a listing) shares one credential and its token cache.
#[async_trait]
pub trait CredentialSource: Send + Sync + std::fmt::Debug {
    /// `None` sends requests unauthenticated.
    async fn credential(&self) -> Result<Option<Arc<dyn TokenCredential>>, AzureError>;
}

/// Sends requests without an `Authorization` header.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousCredential;

#[async_trait]
impl CredentialSource for AnonymousCredential {
    async fn credential(&self) -> Result<Option<Arc<dyn TokenCredential>>, AzureError> {
        Ok(None)
    }
}

/// Service-principal credential built from a tenant id, client id and client
/// secret held in a [`SecretStore`].
///
/// The three values are read from the store each time a credential is
/// requested, so rotated secrets take effect on the next invocation.
#[derive(Debug, Clone)]
pub struct ServicePrincipalCredential {
    secrets: Arc<dyn SecretStore>,
    names: CredentialSecretNames,
}

impl ServicePrincipalCredential {
    pub fn new(secrets: Arc<dyn SecretStore>, names: CredentialSecretNames) -> Self {
        Self { secrets, names }
    }
}

#[async_trait]
impl CredentialSource for ServicePrincipalCredential {
    /// # Errors
    ///
    /// Returns [`AzureError::Secret`] when a value is missing and
    /// [`AzureError::Credential`] if credential construction fails.
    async fn credential(&self) -> Result<Option<Arc<dyn TokenCredential>>, AzureError> {
        let tenant_id = self.secrets.get_secret(&self.names.tenant_id).await?;
        let client_id = self.secrets.get_secret(&self.names.client_id).await?;
        let client_secret = self.secrets.get_secret(&self.names.client_secret).await?;

        debug!(tenant_id = %tenant_id.expose_secret(), "building ClientSecretCredential");

        let credential = azure_identity::ClientSecretCredential::new(
            tenant_id.expose_secret(),
            client_id.expose_secret().clone(),
            Secret::new(client_secret.expose_secret().clone()),
            None,
        )
        .map_err(|e| AzureError::Credential(e.to_string()))?;

        Ok(Some(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretStore;

    #[tokio::test]
    async fn anonymous_has_no_credential() {
        assert!(AnonymousCredential.credential().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_secret_fails_before_any_network_call() {
        let store = StaticSecretStore::new()
            .with_secret("AZURE_TENANT_ID", "tid")
            .with_secret("AZURE_CLIENT_ID", "cid");
        let source = ServicePrincipalCredential::new(Arc::new(store), CredentialSecretNames::default());

        let err = source.credential().await.unwrap_err();
        assert_eq!(err.to_string(), "secret not found: AZURE_CLIENT_SECRET");
    }

    #[tokio::test]
    async fn custom_secret_names_are_used() {
        let names = CredentialSecretNames {
            tenant_id: "SP_TENANT".into(),
            client_id: "SP_CLIENT".into(),
            client_secret: "SP_SECRET".into(),
        };
        let source = ServicePrincipalCredential::new(Arc::new(StaticSecretStore::new()), names);

        let err = source.credential().await.unwrap_err();
        assert_eq!(err.to_string(), "secret not found: SP_TENANT");
    }

    #[tokio::test]
    async fn complete_secrets_build_a_credential() {
        let store = StaticSecretStore::new()
            .with_secret("AZURE_TENANT_ID", "72f988bf-86f1-41af-91ab-2d7cd011db47")
            .with_secret("AZURE_CLIENT_ID", "cid")
            .with_secret("AZURE_CLIENT_SECRET", "shh");
        let source = ServicePrincipalCredential::new(Arc::new(store), CredentialSecretNames::default());

        assert!(source.credential().await.unwrap().is_some());
    }
}
