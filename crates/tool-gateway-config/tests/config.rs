// crates/tool-gateway-config/tests/config.rs
// ============================================================================
// Module: Gateway Config Tests
// Description: Integration tests for environment loading and validation.
// Purpose: Validate defaults, parsing, and fail-closed rejection.
// Dependencies: tool-gateway-config
// ============================================================================

//! ## Overview
//! Loads configuration through an in-memory lookup so the process environment
//! is never touched.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

use std::collections::HashMap;
use std::path::PathBuf;

use tool_gateway_config::ConfigError;
use tool_gateway_config::GatewayConfig;
use tool_gateway_core::BackendMode;
use tool_gateway_core::ToolName;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads config from a fixed set of variables.
fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
    let map: HashMap<String, String> =
        vars.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    GatewayConfig::from_lookup(|name| map.get(name).cloned())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn defaults_apply_when_unset() {
    let config = load(&[]).unwrap();
    assert_eq!(config.backend, BackendMode::Local);
    assert_eq!(config.timeout_ms, 8_000);
    assert_eq!(config.max_bytes, 1_500_000);
    assert_eq!(config.rate_limit_per_minute, 120);
    assert_eq!(config.allowlist.file, None);
    assert_eq!(config.allowlist.inline, None);
    assert_eq!(config.audit_log_path, None);
    assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
    assert!(config.user_agent.starts_with("tool-gateway/"));
    assert_eq!(config, GatewayConfig::default());
}

#[test]
fn values_are_read_and_trimmed() {
    let config = load(&[
        ("TOOL_BACKEND", " N8N "),
        ("WEB_ALLOWLIST", "example.com,docs.rs"),
        ("WEB_ALLOWLIST_FILE", "/etc/tool-gateway/allowlist.txt"),
        ("WEB_TIMEOUT_MS", "2500"),
        ("WEB_MAX_BYTES", "4096"),
        ("N8N_WEB_FETCH_URL", "http://n8n:5678/webhook/web-fetch"),
        ("N8N_WEB_SEARCH_URL", "https://n8n.internal/webhook/web-search"),
        ("TOOL_SHARED_SECRET", "s3cret"),
        ("TOOL_RATE_LIMIT_PER_MINUTE", "7"),
        ("AUDIT_LOG_PATH", "/var/log/tool-gateway/audit.jsonl"),
        ("TOOL_GATEWAY_BIND", "0.0.0.0:9000"),
    ])
    .unwrap();
    assert_eq!(config.backend, BackendMode::N8n);
    assert_eq!(config.allowlist.inline.as_deref(), Some("example.com,docs.rs"));
    assert_eq!(config.allowlist.file, Some(PathBuf::from("/etc/tool-gateway/allowlist.txt")));
    assert_eq!(config.timeout().as_millis(), 2500);
    assert_eq!(config.max_bytes, 4096);
    assert_eq!(config.webhook_url(ToolName::WebFetch), Some("http://n8n:5678/webhook/web-fetch"));
    assert_eq!(
        config.webhook_url(ToolName::WebSearch),
        Some("https://n8n.internal/webhook/web-search")
    );
    assert_eq!(config.shared_secret.as_ref().map(|secret| secret.expose()), Some("s3cret"));
    assert_eq!(config.rate_limit_per_minute, 7);
    assert_eq!(config.bind.port(), 9000);
}

#[test]
fn blank_values_count_as_unset() {
    let config = load(&[("TOOL_BACKEND", "  "), ("N8N_WEB_FETCH_URL", ""), ("TOOL_SHARED_SECRET", " ")])
        .unwrap();
    assert_eq!(config.backend, BackendMode::Local);
    assert_eq!(config.webhook_url(ToolName::WebFetch), None);
    assert!(config.shared_secret.is_none());
}

#[test]
fn rate_limit_is_floored_at_one() {
    assert_eq!(load(&[("TOOL_RATE_LIMIT_PER_MINUTE", "0")]).unwrap().rate_limit_per_minute, 1);
    assert_eq!(load(&[("TOOL_RATE_LIMIT_PER_MINUTE", "-20")]).unwrap().rate_limit_per_minute, 1);
}

#[test]
fn malformed_numbers_are_rejected() {
    let err = load(&[("WEB_TIMEOUT_MS", "soon")]).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { name: "WEB_TIMEOUT_MS", .. }));
    assert!(load(&[("WEB_MAX_BYTES", "-1")]).is_err());
    assert!(load(&[("TOOL_RATE_LIMIT_PER_MINUTE", "lots")]).is_err());
    assert!(load(&[("TOOL_GATEWAY_BIND", "localhost")]).is_err());
}

#[test]
fn unknown_backend_is_rejected() {
    let err = load(&[("TOOL_BACKEND", "remote")]).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { name: "TOOL_BACKEND", .. }));
}

#[test]
fn zero_limits_are_rejected() {
    assert!(matches!(load(&[("WEB_TIMEOUT_MS", "0")]), Err(ConfigError::Invalid(_))));
    assert!(matches!(load(&[("WEB_MAX_BYTES", "0")]), Err(ConfigError::Invalid(_))));
    assert!(matches!(load(&[("TOOL_GATEWAY_MAX_BODY_BYTES", "0")]), Err(ConfigError::Invalid(_))));
}

#[test]
fn webhook_urls_must_be_absolute_http() {
    assert!(load(&[("N8N_WEB_FETCH_URL", "n8n:5678/webhook")]).is_err());
    assert!(load(&[("N8N_WEB_SEARCH_URL", "ftp://n8n/webhook")]).is_err());
}

#[test]
fn secret_is_redacted_in_debug_output() {
    let config = load(&[("TOOL_SHARED_SECRET", "do-not-print")]).unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("do-not-print"));
    assert!(rendered.contains("<redacted>"));
}
