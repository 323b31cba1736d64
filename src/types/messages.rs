use serde::Deserialize;
use serde_json::Value;

use super::detection::{Attributes, Category};
use super::errors::ProtocolError;
use super::tab::TabId;

/// Every message kind the collector answers, by wire name.
pub const MESSAGE_KINDS: &[&str] = &[
    "GET_SESSION_ID",
    "GET_PRIVACY_DATA",
    "UPDATE_BADGE",
    "GET_TAB_STATS",
    "TAB_UPDATED",
    "TAB_ACTIVATED",
    "TAB_REMOVED",
    "CLEAR_SESSION",
    "DETECTION",
    "BEFORE_REQUEST",
];

/// A request sent to the privileged collector by a page, the popup or the
/// browser shim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    GetSessionId {
        hostname: String,
    },
    GetPrivacyData {
        hostname: String,
    },
    UpdateBadge {
        count: u64,
    },
    GetTabStats,
    TabUpdated {
        tab_id: TabId,
        url: String,
        #[serde(default)]
        status: String,
    },
    TabActivated {
        tab_id: TabId,
        url: String,
    },
    TabRemoved {
        tab_id: TabId,
    },
    ClearSession {
        hostname: String,
    },
    Detection {
        category: Category,
        detail: String,
        #[serde(default)]
        attributes: Attributes,
    },
    BeforeRequest {
        tab_id: TabId,
        url: String,
    },
}

impl Message {
    /// Decode a message, telling an unknown kind apart from a bad payload.
    pub fn parse(value: &Value) -> Result<Message, ProtocolError> {
        if !value.is_object() {
            return Err(ProtocolError::Malformed("expected a JSON object".to_string()));
        }
        let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or_default();

        if !MESSAGE_KINDS.contains(&kind) {
            return Err(ProtocolError::UnknownMessageType(kind.to_string()));
        }

        serde_json::from_value(value.clone()).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::GetSessionId { .. } => "GET_SESSION_ID",
            Message::GetPrivacyData { .. } => "GET_PRIVACY_DATA",
            Message::UpdateBadge { .. } => "UPDATE_BADGE",
            Message::GetTabStats => "GET_TAB_STATS",
            Message::TabUpdated { .. } => "TAB_UPDATED",
            Message::TabActivated { .. } => "TAB_ACTIVATED",
            Message::TabRemoved { .. } => "TAB_REMOVED",
            Message::ClearSession { .. } => "CLEAR_SESSION",
            Message::Detection { .. } => "DETECTION",
            Message::BeforeRequest { .. } => "BEFORE_REQUEST",
        }
    }
}
