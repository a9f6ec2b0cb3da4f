use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use trigbench_dispatch::DispatchError;

/// Errors that can occur when running the trigbench server.
///
/// Benchmark and trigger outcomes never surface here; they are always
/// answered with a 200 body. These cover startup failures and malformed
/// invocation envelopes from the Functions host.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The benchmark dispatcher could not be set up.
    #[error("dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The host sent an invocation body we could not parse.
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInvocation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
