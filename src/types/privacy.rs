use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::detection::AggregateCounts;

/// Per-site aggregate as returned by `GET /current/{host}`.
///
/// The remote side omits counters it has never seen, so every field defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    #[serde(default)]
    pub tracker: u64,
    #[serde(default)]
    pub fingerprinting: u64,
    #[serde(default)]
    pub storage: u64,
    #[serde(default)]
    pub pii: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii_types: Option<Vec<String>>,
    /// Anything else the service sends is passed through to the UI untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteReport {
    pub fn counts(&self) -> AggregateCounts {
        AggregateCounts {
            tracker: self.tracker,
            fingerprinting: self.fingerprinting,
            storage: self.storage,
            pii: self.pii,
        }
    }

    pub fn threat_total(&self) -> u64 {
        self.counts().total()
    }
}

/// Uniform result handed to the UI by the data proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success { success: SuccessFlag, data: T },
    Failure { success: FailureFlag, error: String },
}

/// Serializes as `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessFlag;

/// Serializes as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureFlag;

impl Serialize for SuccessFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl Serialize for FailureFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(false)
    }
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope::Success { success: SuccessFlag, data }
    }

    pub fn err(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        Envelope::Failure { success: FailureFlag, error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success { data, .. } => Some(data),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { error, .. } => Some(error),
        }
    }
}

/// Body of `POST /log`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
    pub url: String,
    pub visited_site: String,
    pub session: String,
    pub source: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}
