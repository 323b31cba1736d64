use std::fmt;

// === HookError ===

/// Errors raised while instrumenting one page surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The page does not expose this surface.
    SurfaceAbsent(String),
    /// The surface exists but cannot be redefined.
    SurfaceFrozen(String),
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::SurfaceAbsent(name) => write!(f, "Surface not present: {}", name),
            HookError::SurfaceFrozen(name) => write!(f, "Surface is frozen: {}", name),
        }
    }
}

impl std::error::Error for HookError {}

// === ProxyError ===

/// Errors from calls to the remote log service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Transport-level failure (connection refused, DNS, reset).
    Network(String),
    /// No response within the configured timeout.
    Timeout(String),
    /// The service answered with a non-2xx status.
    Status(u16),
    /// The response body could not be decoded.
    Parse(String),
    /// The hostname cannot be used in a request path.
    InvalidHostname(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Network(msg) => write!(f, "Network error: {}", msg),
            ProxyError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            ProxyError::Status(code) => write!(f, "API returned {}", code),
            ProxyError::Parse(msg) => write!(f, "Invalid response body: {}", msg),
            ProxyError::InvalidHostname(host) => write!(f, "Invalid hostname: {:?}", host),
        }
    }
}

impl std::error::Error for ProxyError {}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Timeout(e.to_string())
        } else if e.is_decode() {
            ProxyError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            ProxyError::Status(status.as_u16())
        } else {
            ProxyError::Network(e.to_string())
        }
    }
}

// === ProtocolError ===

/// Errors in the collector message protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message `type` is not one we handle.
    UnknownMessageType(String),
    /// The message is not a JSON object or a known field has the wrong shape.
    Malformed(String),
    /// The message needs a sender tab and none was given.
    MissingSenderTab(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownMessageType(_) => write!(f, "unknown message type"),
            ProtocolError::Malformed(msg) => write!(f, "malformed message: {}", msg),
            ProtocolError::MissingSenderTab(kind) => {
                write!(f, "message {} requires a sender tab", kind)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

// === TabError ===

/// Errors related to tab monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// Tab with the given ID is not being monitored.
    NotFound(i64),
    /// The URL is not an http(s) page and cannot be monitored.
    NotMonitorable(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::NotMonitorable(url) => write!(f, "Tab URL is not monitorable: {}", url),
        }
    }
}

impl std::error::Error for TabError {}

// === SettingsError ===

/// Errors related to collector settings.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred reading or writing the settings file.
    IoError(String),
    /// Serialization or deserialization failed.
    SerializationError(String),
    /// A setting holds a value the collector cannot use.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}
