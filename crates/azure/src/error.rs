use azure_core::error::ErrorKind;
use thiserror::Error;

/// Errors resolving a secret from a [`SecretStore`](crate::secrets::SecretStore).
#[derive(Debug, Error)]
pub enum SecretError {
    /// No secret with this name exists in the store.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The secret name cannot be used with this store.
    #[error("invalid secret name: {0}")]
    InvalidName(String),

    /// The secret exists but reading it failed.
    #[error("failed to read secret {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to Azure Storage.
#[derive(Debug, Error)]
pub enum AzureError {
    /// The storage service answered with a non-success status.
    #[error("Azure service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The storage service pushed back (429, or 503 `ServerBusy`).
    #[error("Azure request throttled ({status})")]
    Throttled { status: u16 },

    /// A network or connection error occurred communicating with Azure.
    #[error("Azure connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("Azure request timed out")]
    Timeout,

    /// The service answered with a body we could not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Azure credential resolution or token acquisition failed.
    #[error("credential error: {0}")]
    Credential(String),

    /// A credential secret could not be resolved.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl AzureError {
    /// HTTP status the service answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } | Self::Throttled { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<azure_core::Error> for AzureError {
    fn from(err: azure_core::Error) -> Self {
        match err.kind() {
            ErrorKind::HttpResponse {
                status, error_code, ..
            } => {
                let status = u16::from(*status);
                if is_throttled(status, error_code.as_deref()) {
                    return Self::Throttled { status };
                }
                let message = match error_code {
                    Some(code) => code.clone(),
                    None => first_line(&err.to_string()).to_owned(),
                };
                Self::Service { status, message }
            }
            ErrorKind::Io => Self::Connection(err.to_string()),
            ErrorKind::Credential => Self::Credential(err.to_string()),
            ErrorKind::DataConversion => Self::InvalidResponse(err.to_string()),
            ErrorKind::Other => classify_azure_error(&err.to_string()),
        }
    }
}

/// Azure signals back-pressure with 503 `ServerBusy` as well as 429.
fn is_throttled(status: u16, error_code: Option<&str>) -> bool {
    status == 429 || (status == 503 && error_code == Some("ServerBusy"))
}

/// Classify a transport or SDK error string into the appropriate [`AzureError`].
///
/// Inspects the error message for common patterns (throttling, timeout,
/// connection) and maps them to the correct variant.
pub fn classify_azure_error(error_str: &str) -> AzureError {
    let lower = error_str.to_lowercase();
    if lower.contains("429") || lower.contains("throttl") || lower.contains("too many") {
        AzureError::Throttled { status: 429 }
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AzureError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AzureError::Connection(error_str.to_owned())
    } else {
        AzureError::InvalidResponse(error_str.to_owned())
    }
}

// Storage messages carry "RequestId:...\nTime:..." trailers after the text.
fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use azure_core::http::StatusCode;

    use super::*;

    fn http_error(status: u16, error_code: Option<&str>) -> azure_core::Error {
        azure_core::Error::with_message(
            ErrorKind::HttpResponse {
                status: StatusCode::from(status),
                error_code: error_code.map(str::to_owned),
                raw_response: None,
            },
            "The specified container does not exist.\nRequestId:5b2c\nTime:2024-01-01T00:00:00Z",
        )
    }

    #[test]
    fn service_error_keeps_status_and_code() {
        let err = AzureError::from(http_error(404, Some("ContainerNotFound")));
        assert!(matches!(
            &err,
            AzureError::Service { status: 404, message } if message == "ContainerNotFound"
        ));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn service_error_without_code_uses_first_message_line() {
        let err = AzureError::from(http_error(500, None));
        assert_eq!(
            err.to_string(),
            "Azure service error (500): The specified container does not exist."
        );
    }

    #[test]
    fn too_many_requests_is_throttled() {
        let err = AzureError::from(http_error(429, None));
        assert!(matches!(err, AzureError::Throttled { status: 429 }));
    }

    #[test]
    fn server_busy_keeps_its_503() {
        let err = AzureError::from(http_error(503, Some("ServerBusy")));
        assert!(matches!(err, AzureError::Throttled { status: 503 }));
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "Azure request throttled (503)");
    }

    #[test]
    fn other_503_is_a_service_error() {
        let err = AzureError::from(http_error(503, Some("InternalError")));
        assert!(matches!(err, AzureError::Service { status: 503, .. }));
    }

    #[test]
    fn io_and_credential_kinds() {
        let io = azure_core::Error::with_message(ErrorKind::Io, "connection reset");
        assert!(matches!(AzureError::from(io), AzureError::Connection(_)));

        let cred = azure_core::Error::with_message(ErrorKind::Credential, "AADSTS7000215");
        let err = AzureError::from(cred);
        assert!(matches!(err, AzureError::Credential(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn classify_timeout() {
        let err = classify_azure_error("Request timed out after 30s");
        assert!(matches!(err, AzureError::Timeout));
    }

    #[test]
    fn classify_connection() {
        let err = classify_azure_error("Connection refused: 10.0.0.1:443");
        assert!(matches!(err, AzureError::Connection(_)));
    }

    #[test]
    fn classify_throttled_keyword() {
        let err = classify_azure_error("Throttling: too many requests");
        assert!(matches!(err, AzureError::Throttled { status: 429 }));
    }

    #[test]
    fn secret_error_is_transparent() {
        let err: AzureError = SecretError::NotFound("AZURE_TENANT_ID".into()).into();
        assert_eq!(err.to_string(), "secret not found: AZURE_TENANT_ID");
    }
}
