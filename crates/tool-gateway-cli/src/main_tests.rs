// crates/tool-gateway-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and host resolution.
// Purpose: Keep the command surface and its offline helpers stable.
// Dependencies: clap, tool-gateway-core
// ============================================================================

//! ## Overview
//! Parses representative command lines and checks the helpers used by
//! `check-host` and `schema`.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use tool_gateway_core::ToolName;
use tool_gateway_core::contract::SchemaKind;

use super::Cli;
use super::Commands;
use super::SchemaKindArg;
use super::ToolArg;
use super::host_verdict;
use super::resolve_host;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn serve_accepts_bind_override() {
    let cli = Cli::try_parse_from(["tool-gateway", "serve", "--bind", "127.0.0.1:9000"]).unwrap();
    let Commands::Serve(command) = cli.command else {
        panic!("expected serve");
    };
    assert_eq!(command.bind, Some("127.0.0.1:9000".parse().unwrap()));
}

#[test]
fn serve_rejects_malformed_bind() {
    assert!(Cli::try_parse_from(["tool-gateway", "serve", "--bind", "localhost"]).is_err());
}

#[test]
fn schema_accepts_dotted_tool_names() {
    let cli = Cli::try_parse_from(["tool-gateway", "schema", "web.search", "response"]).unwrap();
    let Commands::Schema(command) = cli.command else {
        panic!("expected schema");
    };
    assert_eq!(command.tool, ToolArg::WebSearch);
    assert_eq!(ToolName::from(command.tool), ToolName::WebSearch);
    assert_eq!(SchemaKind::from(command.kind), SchemaKind::Response);
    assert_eq!(command.kind, SchemaKindArg::Response);
}

#[test]
fn schema_rejects_unknown_tool() {
    assert!(Cli::try_parse_from(["tool-gateway", "schema", "web.crawl", "request"]).is_err());
}

#[test]
fn resolve_host_handles_bare_hosts_and_urls() {
    assert_eq!(resolve_host("Example.COM").as_deref(), Some("example.com"));
    assert_eq!(resolve_host("https://docs.rs/serde").as_deref(), Some("docs.rs"));
    assert_eq!(resolve_host("  api.example.com:8443 ").as_deref(), Some("api.example.com"));
    assert_eq!(resolve_host("https://"), None);
}

#[test]
fn verdict_line_names_decision_and_host() {
    assert_eq!(host_verdict("example.com", true), "allow example.com");
    assert_eq!(host_verdict("example.com", false), "deny example.com");
}
