// crates/tool-gateway-server/tests/http_server.rs
// ============================================================================
// Module: HTTP Server Tests
// Description: End-to-end requests against a live axum listener.
// Purpose: Validate routing, body limits, audit files, and webhook auth.
// Dependencies: tool-gateway-server, reqwest, tempfile, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Each test binds the gateway on an ephemeral port, drives it with a real
//! HTTP client, and shuts it down through the graceful-shutdown future.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

use std::net::SocketAddr;
use std::path::Path;
use std::thread;

use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tool_gateway_config::GatewayConfig;
use tool_gateway_config::SharedSecret;
use tool_gateway_core::AllowlistSource;
use tool_gateway_core::BackendMode;
use tool_gateway_server::GatewayServer;
use tool_gateway_server::ServerError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Running gateway handle.
struct Running {
    /// Base URL, e.g. `http://127.0.0.1:1234`.
    base: String,
    /// Shutdown trigger.
    shutdown: oneshot::Sender<()>,
    /// Server task.
    task: JoinHandle<Result<(), ServerError>>,
}

impl Running {
    /// Stops the server and waits for it to drain.
    async fn stop(self) {
        let _ = self.shutdown.send(());
        self.task.await.unwrap().unwrap();
    }
}

/// Starts a gateway for `config` on an ephemeral port.
async fn start(config: GatewayConfig) -> Running {
    let server = GatewayServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve_listener(listener, async move {
        let _ = signal.await;
    }));
    Running {
        base: format!("http://{addr}"),
        shutdown,
        task,
    }
}

/// Configuration with an inline allowlist and audit file.
fn config(allowlist: &str, audit: &Path) -> GatewayConfig {
    GatewayConfig {
        allowlist: AllowlistSource {
            file: None,
            inline: Some(allowlist.to_string()),
        },
        audit_log_path: Some(audit.to_path_buf()),
        ..GatewayConfig::default()
    }
}

/// Reads audit lines as JSON values.
fn audit_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Runs a one-shot webhook that answers 401 unless the expected secret is sent.
fn secured_webhook(expected: &'static str) -> SocketAddr {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        let Ok(request) = server.recv() else {
            return;
        };
        let authorized = request
            .headers()
            .iter()
            .any(|header| header.field.equiv("X-Tool-Secret") && header.value.as_str() == expected);
        let response = if authorized {
            Response::from_string(r#"{"results":[]}"#).with_status_code(200)
        } else {
            Response::from_string(r#"{"message":"Unauthorized"}"#).with_status_code(401)
        };
        let _ = request.respond(response);
    });
    addr
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn health_endpoint_answers() {
    let dir = tempfile::tempdir().unwrap();
    let running = start(config("", &dir.path().join("audit.jsonl"))).await;
    let response = reqwest::get(format!("{}/health", running.base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["status"], "healthy");
    running.stop().await;
}

#[tokio::test]
async fn denied_fetch_is_written_to_audit_file() {
    let dir = tempfile::tempdir().unwrap();
    let audit = dir.path().join("audit.jsonl");
    let running = start(config("allowed.org", &audit)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/tools/web.fetch", running.base))
        .json(&json!({
            "agent_id": "agent-1",
            "purpose": "test",
            "request_id": "corr-9",
            "inputs": { "url": "https://example.com/" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "POLICY_DENIED");
    running.stop().await;

    let lines = audit_lines(&audit);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["decision"], "deny");
    assert_eq!(lines[0]["reason_code"], "POLICY_DENIED");
    assert_eq!(lines[0]["domain"], "example.com");
    assert_eq!(lines[0]["correlation_id"], "corr-9");
    assert_eq!(lines[0]["tool_name"], "web.fetch");
}

#[tokio::test]
async fn oversize_body_becomes_bad_request_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let audit = dir.path().join("audit.jsonl");
    let running = start(GatewayConfig {
        max_body_bytes: 64,
        ..config("*", &audit)
    })
    .await;

    let oversized = json!({
        "agent_id": "agent-1",
        "purpose": "x".repeat(200),
        "inputs": { "query": "rust" }
    });
    let response = reqwest::Client::new()
        .post(format!("{}/tools/web.search", running.base))
        .json(&oversized)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["source_meta"]["tool"], "web.search");
    running.stop().await;

    let lines = audit_lines(&audit);
    assert_eq!(lines.len(), 1);
    assert!(lines[0]["bytes_in"].as_u64().unwrap() > 64);
}

#[tokio::test]
async fn wrong_shared_secret_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let webhook = secured_webhook("right-secret");
    let running = start(GatewayConfig {
        backend: BackendMode::N8n,
        n8n_web_search_url: Some(format!("http://{webhook}/webhook/search")),
        shared_secret: Some(SharedSecret::new("wrong-secret")),
        ..config("", &dir.path().join("audit.jsonl"))
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/tools/web.search", running.base))
        .json(&json!({ "agent_id": "a", "purpose": "p", "inputs": { "query": "rust" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["source_meta"]["backend"], "n8n");
    running.stop().await;
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let running = start(config("", &dir.path().join("audit.jsonl"))).await;
    let response = reqwest::Client::new()
        .post(format!("{}/tools/web.crawl", running.base))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    running.stop().await;
}
