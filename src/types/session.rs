use std::fmt;

use serde::Serialize;

/// Canonical host key used to correlate sessions and counters.
///
/// Built only through [`SiteIdentity::from_hostname`], which lowercases and
/// strips leading `www.` labels. The result depends on nothing but the raw hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SiteIdentity(String);

impl SiteIdentity {
    pub fn from_hostname(raw: &str) -> Self {
        Self(canonicalize_hostname(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase a hostname and strip its leading `www.` labels.
///
/// Repeated labels are all removed so that `canon(canon(h)) == canon(h)`.
/// A bare `www.` is left as is.
pub fn canonicalize_hostname(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    let mut host = lowered.as_str();
    while let Some(rest) = host.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        host = rest;
    }
    host.to_string()
}

/// A live per-site session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub site: SiteIdentity,
    pub created_at: i64,
}
