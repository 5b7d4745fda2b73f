// crates/tool-gateway-config/src/lib.rs
// ============================================================================
// Module: Tool Gateway Config Library
// Description: Public API surface for gateway configuration.
// Purpose: Expose environment loading and validation.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Gateway configuration is read from process environment variables, with
//! defaults for every optional setting. Loading goes through an injectable
//! lookup so tests never mutate the real environment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::GatewayConfig;
pub use config::SharedSecret;
