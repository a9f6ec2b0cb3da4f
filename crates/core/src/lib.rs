pub mod blob_url;
pub mod error;
pub mod outcome;
pub mod trigger;
pub mod workload;

pub use blob_url::BlobLocation;
pub use error::{BlobUrlError, RequestError};
pub use outcome::{CONTENT_TYPE_TEXT, DispatchResult, INVALID_PARAMETERS_BODY};
pub use trigger::{BenchmarkQuery, BenchmarkRequest, INPUT_DELIMITER, TriggerKind};
pub use workload::{DEFAULT_WORKLOAD_N, MAX_WORKLOAD_N, factorial};
