// crates/tool-gateway-server/src/lib.rs
// ============================================================================
// Module: Tool Gateway Server Library
// Description: Request mediation, audit, and the HTTP surface.
// Purpose: Expose the mediator pipeline and the axum server around it.
// Dependencies: crate::{audit, mediator, server}
// ============================================================================

//! ## Overview
//! The [`RequestMediator`] runs every tool call through validation, rate
//! limiting, host policy, dispatch, normalization, and audit, always producing
//! an [`tool_gateway_core::Envelope`]. [`GatewayServer`] exposes it over HTTP.
//! Security posture: request bodies and upstream replies are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod mediator;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditDecision;
pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::StdoutAuditSink;
pub use audit::audit_sink_from_config;
pub use mediator::RequestMediator;
pub use mediator::ToolResponse;
pub use server::GatewayServer;
pub use server::ServerError;
pub use server::build_router;
