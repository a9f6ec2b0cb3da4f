use thiserror::Error;

use crate::trigger::TriggerKind;

/// Reasons a benchmark query is rejected before any external call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A required query parameter was absent or empty.
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// The `trigger` parameter is not one of `http`, `storage` or `queue`.
    #[error("unsupported trigger type: {0}")]
    UnsupportedTrigger(String),

    /// A comma-delimited input did not split into the expected fields.
    #[error("{trigger} input must be `{expected}`, got {found} field(s)")]
    FieldCount {
        trigger: TriggerKind,
        expected: &'static str,
        found: usize,
    },

    /// One of the positional fields was empty.
    #[error("{trigger} input `{expected}` has an empty field")]
    EmptyField {
        trigger: TriggerKind,
        expected: &'static str,
    },

    /// A container or queue name that Azure Storage would not accept.
    #[error("{trigger} input has an invalid {field} name: {name:?}")]
    InvalidName {
        trigger: TriggerKind,
        field: &'static str,
        name: String,
    },
}

/// Errors produced when deriving a [`BlobLocation`](crate::BlobLocation) from
/// a blob-created event URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobUrlError {
    /// Fewer than three significant path segments were found.
    #[error("blob url has {found} significant segment(s), expected 3: {url}")]
    TooFewSegments { url: String, found: usize },

    /// The host segment did not start with an account name.
    #[error("blob url host has no account name: {0}")]
    MissingAccount(String),
}
