// crates/tool-gateway-providers/tests/http_fetch.rs
// ============================================================================
// Module: Local Fetcher Tests
// Description: HTTP fetcher behavior against stub servers.
// Purpose: Validate truncation, redirects, status passthrough, and deadlines.
// Dependencies: tool-gateway-providers, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Each test runs a single-purpose `tiny_http` server on an ephemeral port.
//!
//! Security posture: targets may lie about lengths or hang; the fetcher must
//! stay within its byte cap and deadline.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tool_gateway_providers::FetchLimits;
use tool_gateway_providers::HttpFetcher;
use tool_gateway_providers::UpstreamError;
use tool_gateway_providers::WebFetcher;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Standard limits used by the tests.
fn limits(max_bytes: usize, timeout_ms: u64) -> FetchLimits {
    FetchLimits {
        timeout: Duration::from_millis(timeout_ms),
        max_bytes,
        user_agent: "tool-gateway-test/1.0".to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn fetch_extracts_title_and_text() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let agent = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("User-Agent"))
                .map(|header| header.value.as_str().to_string());
            let _ = request.respond(Response::from_string(
                "<html><title>Example Domain</title><body><h1>Example</h1> text</body></html>",
            ));
            agent
        } else {
            None
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&format!("http://{addr}/"), &limits(1_500_000, 5_000)).await.unwrap();
    assert_eq!(result.status_code, 200);
    assert_eq!(result.title, "Example Domain");
    assert_eq!(result.extracted_text, "Example Domain Example text");
    assert_eq!(result.final_url, format!("http://{addr}/"));
    assert_eq!(handle.join().unwrap().as_deref(), Some("tool-gateway-test/1.0"));
}

#[tokio::test]
async fn body_beyond_cap_is_discarded() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let mut body = "<html><head><title>Big</title></head><body>".to_string();
            body.push_str(&"x".repeat(10_019 - body.len()));
            let _ = request.respond(Response::from_string(body));
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&format!("http://{addr}/big"), &limits(50, 5_000)).await.unwrap();
    assert_eq!(result.title, "Big");
    assert!(result.extracted_text.len() <= 50);
    handle.join().unwrap();
}

#[tokio::test]
async fn stalled_body_returns_once_cap_is_reached() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let mut body = "<title>Stall</title>".to_string();
            body.push_str(&"s".repeat(64 - body.len()));
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 100000\r\n\r\n";
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body.as_bytes());
            let _ = stream.flush();
            thread::sleep(Duration::from_millis(2_000));
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let started = Instant::now();
    let result = fetcher.fetch(&format!("http://{addr}/stall"), &limits(64, 1_500)).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(1_000));
    assert_eq!(result.status_code, 200);
    assert_eq!(result.title, "Stall");
    handle.join().unwrap();
}

#[tokio::test]
async fn redirects_report_final_url() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        for _ in 0..2 {
            let Ok(request) = server.recv() else {
                return;
            };
            if request.url() == "/start" {
                let location =
                    Header::from_bytes(&b"Location"[..], format!("http://{addr}/final").as_bytes()).unwrap();
                let _ = request.respond(Response::empty(302).with_header(location));
            } else {
                let _ = request.respond(Response::from_string("<title>Final</title>"));
            }
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&format!("http://{addr}/start"), &limits(4_096, 5_000)).await.unwrap();
    assert_eq!(result.final_url, format!("http://{addr}/final"));
    assert_eq!(result.title, "Final");
    handle.join().unwrap();
}

#[tokio::test]
async fn error_statuses_are_data() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = request.respond(Response::from_string("<title>Gone</title>").with_status_code(404));
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&format!("http://{addr}/missing"), &limits(4_096, 5_000)).await.unwrap();
    assert_eq!(result.status_code, 404);
    assert_eq!(result.title, "Gone");
    handle.join().unwrap();
}

#[tokio::test]
async fn hanging_target_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(Duration::from_millis(1_500));
        }
    });

    let fetcher = HttpFetcher::new().unwrap();
    let started = Instant::now();
    let err = fetcher.fetch(&format!("http://{addr}/slow"), &limits(4_096, 200)).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_millis(1_400));
    handle.join().unwrap();
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher.fetch(&format!("http://{addr}/"), &limits(4_096, 2_000)).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Transport(_)), "unexpected error: {err}");
}
