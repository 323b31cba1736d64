use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::session::SiteIdentity;

/// Kind of privacy-relevant behavior a detection describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Storage,
    Fingerprinting,
    Tracker,
    Pii,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Tracker,
        Category::Fingerprinting,
        Category::Storage,
        Category::Pii,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Storage => "storage",
            Category::Fingerprinting => "fingerprinting",
            Category::Tracker => "tracker",
            Category::Pii => "pii",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open key/value map attached to a detection.
pub type Attributes = BTreeMap<String, Value>;

/// A detection as produced inside the page context.
///
/// Site and session are unknown there; the privileged listener attaches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub category: Category,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl RawDetection {
    pub fn new(category: Category, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
            timestamp: Utc::now(),
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// A fully attributed detection. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    category: Category,
    detail: String,
    timestamp: DateTime<Utc>,
    site: SiteIdentity,
    session: String,
    attributes: Attributes,
}

impl DetectionEvent {
    pub fn attach(raw: RawDetection, site: SiteIdentity, session: String) -> Self {
        Self {
            category: raw.category,
            detail: raw.detail,
            timestamp: raw.timestamp,
            site,
            session,
            attributes: raw.attributes,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn site(&self) -> &SiteIdentity {
        &self.site
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Per-tab counters, one per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    pub tracker: u64,
    pub fingerprinting: u64,
    pub storage: u64,
    pub pii: u64,
}

impl AggregateCounts {
    /// Sum of all counters. Remote reports may carry arbitrary values, so the
    /// sum saturates.
    pub fn total(&self) -> u64 {
        self.tracker
            .saturating_add(self.fingerprinting)
            .saturating_add(self.storage)
            .saturating_add(self.pii)
    }

    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Tracker => self.tracker,
            Category::Fingerprinting => self.fingerprinting,
            Category::Storage => self.storage,
            Category::Pii => self.pii,
        }
    }

    pub(crate) fn increment(&mut self, category: Category) {
        match category {
            Category::Tracker => self.tracker += 1,
            Category::Fingerprinting => self.fingerprinting += 1,
            Category::Storage => self.storage += 1,
            Category::Pii => self.pii += 1,
        }
    }
}
