use privacy_guard::types::errors::*;

// === HookError Tests ===

#[test]
fn hook_error_display_variants() {
    assert_eq!(
        HookError::SurfaceAbsent("indexedDB".to_string()).to_string(),
        "Surface not present: indexedDB"
    );
    assert_eq!(
        HookError::SurfaceFrozen("navigator".to_string()).to_string(),
        "Surface is frozen: navigator"
    );
}

// === ProxyError Tests ===

#[test]
fn proxy_error_status_display() {
    assert_eq!(ProxyError::Status(500).to_string(), "API returned 500");
    assert_eq!(ProxyError::Status(404).to_string(), "API returned 404");
}

#[test]
fn proxy_error_display_never_empty() {
    let errors = vec![
        ProxyError::Network(String::new()),
        ProxyError::Timeout(String::new()),
        ProxyError::Parse(String::new()),
        ProxyError::InvalidHostname(String::new()),
    ];
    for err in errors {
        assert!(!err.to_string().is_empty(), "{:?} has an empty message", err);
    }
}

#[test]
fn proxy_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(ProxyError::Timeout("10s".to_string()));
    assert!(err.source().is_none());
    assert_eq!(err.to_string(), "Request timed out: 10s");
}

// === ProtocolError Tests ===

#[test]
fn protocol_error_unknown_type_is_fixed_marker() {
    let err = ProtocolError::UnknownMessageType("PING".to_string());
    assert_eq!(err.to_string(), "unknown message type");
}

#[test]
fn protocol_error_other_variants() {
    assert_eq!(
        ProtocolError::Malformed("expected a JSON object".to_string()).to_string(),
        "malformed message: expected a JSON object"
    );
    assert_eq!(
        ProtocolError::MissingSenderTab("DETECTION".to_string()).to_string(),
        "message DETECTION requires a sender tab"
    );
}

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound(42);
    assert_eq!(err.to_string(), "Tab not found: 42");
}

#[test]
fn tab_error_not_monitorable_display() {
    let err = TabError::NotMonitorable("about:blank".to_string());
    assert_eq!(err.to_string(), "Tab URL is not monitorable: about:blank");
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("disk full".to_string()).to_string(),
        "Settings I/O error: disk full"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
    assert_eq!(
        SettingsError::InvalidValue("expected u64".to_string()).to_string(),
        "Invalid settings value: expected u64"
    );
}
