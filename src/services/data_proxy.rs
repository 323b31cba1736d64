//! Data Proxy for Privacy Guard.
//!
//! Privileged intermediary between the popup UI and the remote log service.
//! Every public entry point that faces the UI returns an [`Envelope`]; errors
//! are converted, never propagated.

use std::time::Duration;

use tracing::{debug, warn};

use crate::managers::session_manager::SessionManagerTrait;
use crate::types::errors::ProxyError;
use crate::types::privacy::{Envelope, LogRecord, SiteReport};
use crate::types::session::canonicalize_hostname;

/// HTTP client for the remote log service.
pub struct DataProxy {
    base_url: String,
    http_client: reqwest::Client,
}

impl DataProxy {
    /// Create a proxy for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `getSessionId`: delegates to the session registry. Never creates a
    /// session; sessions start on navigation.
    pub fn get_session_id(
        &self,
        sessions: &dyn SessionManagerTrait,
        hostname: &str,
    ) -> Option<String> {
        sessions.lookup_session(hostname).map(|s| s.id)
    }

    /// `getPrivacyData`: the remote aggregate for a site, wrapped in an envelope.
    pub async fn get_privacy_data(&self, hostname: &str) -> Envelope<SiteReport> {
        match self.fetch_site_report(hostname).await {
            Ok(report) => Envelope::ok(report),
            Err(e) => {
                warn!(hostname, error = %e, "privacy data request failed");
                Envelope::err(e.to_string())
            }
        }
    }

    /// `GET /current/{host}` with the hostname canonicalized first.
    pub async fn fetch_site_report(&self, hostname: &str) -> Result<SiteReport, ProxyError> {
        let host = request_host(hostname)?;
        let url = format!("{}/current/{}", self.base_url, host);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProxyError::Status(response.status().as_u16()));
        }

        response
            .json::<SiteReport>()
            .await
            .map_err(|e| ProxyError::Parse(e.to_string()))
    }

    /// `POST /log`. Any non-2xx answer is an error.
    pub async fn post_log(&self, record: &LogRecord) -> Result<(), ProxyError> {
        let url = format!("{}/log", self.base_url);

        let response = self.http_client.post(&url).json(record).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!(kind = %record.kind, "log record accepted");
            Ok(())
        } else {
            Err(ProxyError::Status(status.as_u16()))
        }
    }
}

/// Canonical host suitable for a single path segment.
fn request_host(hostname: &str) -> Result<String, ProxyError> {
    let host = canonicalize_hostname(hostname.trim());
    let usable = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'));
    if usable {
        Ok(host)
    } else {
        Err(ProxyError::InvalidHostname(hostname.to_string()))
    }
}
