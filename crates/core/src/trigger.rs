use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Separator between positional fields of the `input` parameter.
pub const INPUT_DELIMITER: char = ',';

const QUEUE_FIELDS: &str = "queue,storageAccount";
const STORAGE_FIELDS: &str = "container,storageAccount";

/// The trigger path a benchmark invocation exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Http,
    Storage,
    Queue,
}

impl TriggerKind {
    /// The query-string spelling of this trigger.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Storage => "storage",
            Self::Queue => "queue",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "storage" => Ok(Self::Storage),
            "queue" => Ok(Self::Queue),
            other => Err(RequestError::UnsupportedTrigger(other.to_owned())),
        }
    }
}

/// Raw query parameters of the benchmark entry point.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchmarkQuery {
    /// One of `http`, `storage`, `queue`.
    pub trigger: Option<String>,
    /// Trigger-specific input: a URL, or `name,storageAccount`.
    pub input: Option<String>,
}

impl BenchmarkQuery {
    pub fn new(trigger: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            trigger: Some(trigger.into()),
            input: Some(input.into()),
        }
    }
}

/// A validated benchmark request. Constructed once per invocation and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchmarkRequest {
    /// Issue a GET against `url`.
    Http { url: String },
    /// Upload a blob into `container` on `storage_account`.
    Storage {
        container: String,
        storage_account: String,
    },
    /// Send a message to `queue` on `storage_account`.
    Queue {
        queue: String,
        storage_account: String,
    },
}

impl BenchmarkRequest {
    /// Validate raw query parameters, failing closed on anything unexpected.
    pub fn parse(query: &BenchmarkQuery) -> Result<Self, RequestError> {
        let trigger = non_empty(query.trigger.as_deref())
            .ok_or(RequestError::MissingParameter("trigger"))?;
        let kind: TriggerKind = trigger.parse()?;
        let input =
            non_empty(query.input.as_deref()).ok_or(RequestError::MissingParameter("input"))?;

        match kind {
            TriggerKind::Http => Ok(Self::Http {
                url: input.to_owned(),
            }),
            TriggerKind::Storage => {
                let (container, storage_account) = split_pair(kind, input, STORAGE_FIELDS)?;
                check_resource_name(kind, "container", &container)?;
                Ok(Self::Storage {
                    container,
                    storage_account,
                })
            }
            TriggerKind::Queue => {
                let (queue, storage_account) = split_pair(kind, input, QUEUE_FIELDS)?;
                check_resource_name(kind, "queue", &queue)?;
                Ok(Self::Queue {
                    queue,
                    storage_account,
                })
            }
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Http { .. } => TriggerKind::Http,
            Self::Storage { .. } => TriggerKind::Storage,
            Self::Queue { .. } => TriggerKind::Queue,
        }
    }

    /// Human-readable target of the external action, used as the dependency
    /// target in telemetry.
    pub fn target(&self) -> String {
        match self {
            Self::Http { url } => url.clone(),
            Self::Storage {
                container,
                storage_account,
            } => format!("{storage_account}/{container}"),
            Self::Queue {
                queue,
                storage_account,
            } => format!("{storage_account}/{queue}"),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn split_pair(
    trigger: TriggerKind,
    input: &str,
    expected: &'static str,
) -> Result<(String, String), RequestError> {
    let fields: Vec<&str> = input.split(INPUT_DELIMITER).collect();
    let [first, second] = fields.as_slice() else {
        return Err(RequestError::FieldCount {
            trigger,
            expected,
            found: fields.len(),
        });
    };
    if first.is_empty() || second.is_empty() {
        return Err(RequestError::EmptyField { trigger, expected });
    }
    Ok(((*first).to_owned(), (*second).to_owned()))
}

/// Container and queue names: 3 to 63 lowercase letters, digits and single
/// hyphens, starting and ending with a letter or digit.
fn check_resource_name(
    trigger: TriggerKind,
    field: &'static str,
    name: &str,
) -> Result<(), RequestError> {
    let valid = (3..=63).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if valid {
        Ok(())
    } else {
        Err(RequestError::InvalidName {
            trigger,
            field,
            name: name.to_owned(),
        })
    }
}
