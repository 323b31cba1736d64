//! Event Reporter for Privacy Guard.
//!
//! Forwards each accepted detection to the remote service as a `POST /log`
//! body. Fire-and-forget: failures are logged and never retried.

use std::sync::Arc;

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::services::data_proxy::DataProxy;
use crate::types::detection::DetectionEvent;
use crate::types::privacy::LogRecord;

/// Value of the `source` field on every record we send.
pub const LOG_SOURCE: &str = "extension";

/// Build the wire record for one event seen on `page_url`.
pub fn build_record(event: &DetectionEvent, page_url: &str) -> LogRecord {
    let attributes: Map<String, Value> = event
        .attributes()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    LogRecord {
        timestamp: event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
        kind: event.category().as_str().to_string(),
        detail: event.detail().to_string(),
        url: page_url.to_string(),
        visited_site: event.site().to_string(),
        session: event.session().to_string(),
        source: LOG_SOURCE.to_string(),
        attributes,
    }
}

pub struct EventReporter {
    proxy: Arc<DataProxy>,
}

impl EventReporter {
    pub fn new(proxy: Arc<DataProxy>) -> Self {
        Self { proxy }
    }

    /// Post the event in the background. Skipped outside a tokio runtime.
    pub fn report(&self, event: &DetectionEvent, page_url: &str) {
        let record = build_record(event, page_url);

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!(kind = %record.kind, "no runtime, log record not sent");
                return;
            }
        };

        let proxy = Arc::clone(&self.proxy);
        handle.spawn(async move {
            if let Err(e) = proxy.post_log(&record).await {
                warn!(kind = %record.kind, site = %record.visited_site, error = %e, "log post failed");
            }
        });
    }
}
