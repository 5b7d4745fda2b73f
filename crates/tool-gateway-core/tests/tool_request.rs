// crates/tool-gateway-core/tests/tool_request.rs
// ============================================================================
// Module: Tool Request Validation Tests
// Description: Integration tests for request body parsing.
// Purpose: Validate accepted shapes, defaults, and rejection reasons.
// Dependencies: tool-gateway-core
// ============================================================================

//! ## Overview
//! Request bodies are untrusted; these tests pin what is accepted.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

use tool_gateway_core::BackendMode;
use tool_gateway_core::RequestError;
use tool_gateway_core::RequestLabels;
use tool_gateway_core::ToolName;
use tool_gateway_core::WebFetchRequest;
use tool_gateway_core::WebSearchRequest;

#[test]
fn fetch_request_parses() {
    let body = br#"{"agent_id":"a1","purpose":"research","request_id":"r1","inputs":{"url":"https://example.com"}}"#;
    let request = WebFetchRequest::from_slice(body).unwrap();
    assert_eq!(request.agent_id, "a1");
    assert_eq!(request.request_id.as_deref(), Some("r1"));
    assert_eq!(request.inputs.url, "https://example.com");
}

#[test]
fn search_max_results_defaults_to_five() {
    let body = br#"{"agent_id":"a1","purpose":"p","inputs":{"query":"rust"}}"#;
    let request = WebSearchRequest::from_slice(body).unwrap();
    assert_eq!(request.inputs.max_results, 5);
    assert_eq!(request.request_id, None);
}

#[test]
fn unknown_fields_are_ignored() {
    let body = br#"{"agent_id":"a","purpose":"p","extra":1,"inputs":{"url":"https://x.test","other":true}}"#;
    assert!(WebFetchRequest::from_slice(body).is_ok());
}

#[test]
fn missing_fields_are_rejected() {
    let body = br#"{"agent_id":"a","inputs":{"url":"https://x.test"}}"#;
    assert!(matches!(WebFetchRequest::from_slice(body), Err(RequestError::InvalidShape(_))));
    let body = br#"{"agent_id":"a","purpose":"p","inputs":{}}"#;
    assert!(matches!(WebFetchRequest::from_slice(body), Err(RequestError::InvalidShape(_))));
}

#[test]
fn non_object_bodies_are_rejected() {
    assert!(matches!(WebFetchRequest::from_slice(b"[1,2]"), Err(RequestError::NotAnObject)));
    assert!(matches!(WebFetchRequest::from_slice(b"\"x\""), Err(RequestError::NotAnObject)));
    assert!(matches!(WebFetchRequest::from_slice(b"{not json"), Err(RequestError::InvalidJson(_))));
}

#[test]
fn wrong_types_are_rejected() {
    let body = br#"{"agent_id":7,"purpose":"p","inputs":{"url":"https://x.test"}}"#;
    assert!(WebFetchRequest::from_slice(body).is_err());
    let body = br#"{"agent_id":"a","purpose":"p","inputs":{"query":"q","max_results":"ten"}}"#;
    assert!(WebSearchRequest::from_slice(body).is_err());
}

#[test]
fn large_max_results_is_accepted_as_given() {
    let body = br#"{"agent_id":"a","purpose":"p","inputs":{"query":"q","max_results":100}}"#;
    assert_eq!(WebSearchRequest::from_slice(body).unwrap().inputs.max_results, 100);
}

#[test]
fn non_integer_max_results_is_rejected_with_message() {
    let bodies: [&[u8]; 2] = [
        br#"{"agent_id":"a","purpose":"p","inputs":{"query":"q","max_results":-1}}"#,
        br#"{"agent_id":"a","purpose":"p","inputs":{"query":"q","max_results":2.5}}"#,
    ];
    for body in bodies {
        let err = WebSearchRequest::from_slice(body).unwrap_err();
        assert!(matches!(err, RequestError::InvalidShape(_)));
        assert!(err.details()["errors"][0]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[test]
fn labels_are_peeked_from_invalid_bodies() {
    let labels = RequestLabels::peek(br#"{"agent_id":"agent-9","request_id":"req-1","inputs":5}"#);
    assert_eq!(labels.requester.as_deref(), Some("agent-9"));
    assert_eq!(labels.correlation_id.as_deref(), Some("req-1"));
    assert_eq!(RequestLabels::peek(b"garbage"), RequestLabels::default());
}

#[test]
fn names_and_modes_parse() {
    assert_eq!("web.fetch".parse::<ToolName>().unwrap(), ToolName::WebFetch);
    assert!("web.crawl".parse::<ToolName>().is_err());
    assert_eq!(" N8N ".parse::<BackendMode>().unwrap(), BackendMode::N8n);
    assert!("remote".parse::<BackendMode>().is_err());
}
