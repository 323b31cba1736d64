//! Message handler and request loop for the Privacy Guard collector protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_message` decodes one protocol message and dispatches it to the
//! `Collector`. Every outcome, including failures, is a JSON value; nothing
//! is left unanswered. `serve` runs the newline-delimited JSON loop over any
//! reader/writer pair.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::app::{Collector, RequestVerdict};
use crate::types::detection::RawDetection;
use crate::types::errors::{ProtocolError, TabError};
use crate::types::messages::Message;
use crate::types::tab::{TabId, TabSnapshot};

fn error_value(message: impl std::fmt::Display) -> Value {
    json!({ "error": message.to_string() })
}

fn tab_value(result: Result<TabSnapshot, TabError>) -> Value {
    match result {
        Ok(snapshot) => json!({ "monitoring": snapshot.monitoring, "tab": snapshot }),
        Err(TabError::NotMonitorable(_)) => json!({ "monitoring": false }),
        Err(e) => error_value(e),
    }
}

/// Dispatch one message. `sender_tab` is the tab the message came from, when
/// it came from a page.
pub async fn handle_message(
    collector: &Arc<Collector>,
    sender_tab: Option<TabId>,
    message: &Value,
) -> Value {
    let message = match Message::parse(message) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "rejected message");
            return error_value(e);
        }
    };
    debug!(kind = message.kind(), sender_tab, "message received");

    match message {
        // ─── Page and popup queries ───
        Message::GetSessionId { hostname } => {
            json!({ "sessionId": collector.get_session_id(&hostname) })
        }
        Message::GetPrivacyData { hostname } => {
            let envelope = collector.get_privacy_data(&hostname).await;
            serde_json::to_value(envelope).unwrap_or_else(|e| {
                json!({ "success": false, "error": format!("encode error: {}", e) })
            })
        }
        Message::UpdateBadge { count } => {
            if let Some(tab_id) = sender_tab {
                collector.update_badge(tab_id, count);
            }
            json!({ "success": true })
        }
        Message::GetTabStats => {
            let stats = collector.tab_stats(sender_tab);
            json!({ "count": stats.count, "session_id": stats.session_id })
        }

        // ─── Browser events ───
        Message::TabUpdated { tab_id, url, status } => {
            match collector.on_tab_updated(tab_id, &url, &status) {
                Ok(Some(snapshot)) => tab_value(Ok(snapshot)),
                Ok(None) => json!({ "monitoring": collector.snapshot(tab_id).is_ok() }),
                Err(e) => tab_value(Err(e)),
            }
        }
        Message::TabActivated { tab_id, url } => tab_value(collector.on_tab_activated(tab_id, &url)),
        Message::TabRemoved { tab_id } => match collector.on_tab_removed(tab_id) {
            Ok(_) => json!({ "success": true }),
            Err(e) => error_value(e),
        },
        Message::ClearSession { hostname } => {
            let cleared = collector.clear_session(&hostname);
            json!({ "success": true, "cleared": cleared.is_some() })
        }
        Message::BeforeRequest { tab_id, url } => {
            let verdict = collector.on_before_request(Some(tab_id), &url);
            json!({ "cancel": verdict == RequestVerdict::Block })
        }

        // ─── Relayed detections ───
        Message::Detection {
            category,
            detail,
            attributes,
        } => {
            let Some(tab_id) = sender_tab else {
                return error_value(ProtocolError::MissingSenderTab("DETECTION".to_string()));
            };
            let mut raw = RawDetection::new(category, detail);
            raw.attributes = attributes;
            match collector.ingest(tab_id, raw) {
                Some(outcome) => json!({
                    "accepted": true,
                    "total": outcome.total,
                    "alert": outcome.alert,
                }),
                None => json!({ "accepted": false }),
            }
        }
    }
}

/// Remote queries allowed per second. Page and browser events are never
/// throttled.
const REMOTE_QUERIES_PER_SECOND: u32 = 200;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Kinds answered by the remote service. They run on their own task.
fn is_remote_query(message: &Value) -> bool {
    message.get("type").and_then(Value::as_str) == Some("GET_PRIVACY_DATA")
}

/// Run the request loop until `reader` is exhausted.
///
/// Request:  `{"id":1, "tab_id":7, "message":{"type":"GET_TAB_STATS"}}`
/// Response: `{"id":1, "result":{...}}` or `{"id":1, "error":"..."}`
///
/// Local messages are answered in arrival order. Remote queries are spawned
/// and answer whenever the service does, so their replies may overtake or
/// trail later requests; clients match replies by `id`. A single writer task
/// owns `writer`.
pub async fn serve<R, W>(reader: R, writer: W, collector: Arc<Collector>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (replies, mut outbox) = mpsc::unbounded_channel::<Value>();
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(reply) = outbox.recv().await {
            let mut line = reply.to_string();
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<(), io::Error>(())
    });

    let mut remote = JoinSet::new();
    let mut rate_limiter = RateLimiter::new(REMOTE_QUERIES_PER_SECOND);
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "request read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        while remote.try_join_next().is_some() {}

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let reply = json!({"id": null, "error": format!("parse error: {}", e)});
                if replies.send(reply).is_err() {
                    break;
                }
                continue;
            }
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let tab_id = request.get("tab_id").and_then(Value::as_i64);
        let message = request.get("message").cloned().unwrap_or(Value::Null);

        if is_remote_query(&message) {
            if !rate_limiter.check() {
                warn!("remote query rate limit exceeded");
                if replies.send(json!({"id": id, "error": "rate limit exceeded"})).is_err() {
                    break;
                }
                continue;
            }
            let collector = Arc::clone(&collector);
            let replies = replies.clone();
            remote.spawn(async move {
                let result = handle_message(&collector, tab_id, &message).await;
                let _ = replies.send(json!({"id": id, "result": result}));
            });
            continue;
        }

        let result = handle_message(&collector, tab_id, &message).await;
        if replies.send(json!({"id": id, "result": result})).is_err() {
            break;
        }
    }

    while remote.join_next().await.is_some() {}
    drop(replies);
    writer_task
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
