use thiserror::Error;

/// Errors raised while recovering a carried operation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// The payload does not carry an identifier at all.
    #[error("no operation id found in {0}")]
    Missing(&'static str),

    /// The carried value could not be decoded.
    #[error("malformed operation id in {transport}: {reason}")]
    Malformed {
        transport: &'static str,
        reason: String,
    },
}
