use serde::{Deserialize, Serialize};

/// Collector configuration, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardSettings {
    /// Base URL of the log-ingestion/query service.
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Alerts fire each time a tab's total reaches a multiple of this.
    pub alert_step: u64,
    pub block_trackers: bool,
    pub session_header: String,
    pub extra_tracker_domains: Vec<String>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8081".to_string(),
            poll_interval_secs: 5,
            request_timeout_secs: 10,
            alert_step: 10,
            block_trackers: true,
            session_header: "X-PrivacyProxy-Session".to_string(),
            extra_tracker_domains: Vec::new(),
        }
    }
}
