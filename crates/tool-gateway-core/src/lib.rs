// crates/tool-gateway-core/src/lib.rs
// ============================================================================
// Module: Tool Gateway Core Library
// Description: Public API surface for the tool gateway core.
// Purpose: Expose envelopes, tool requests, policy, and rate limiting.
// Dependencies: crate::{contract, envelope, hashing, policy, rate_limit, tool}
// ============================================================================

//! ## Overview
//! Tool gateway core holds the transport-agnostic pieces of the request
//! mediation pipeline: the canonical response [`Envelope`] and its closed error
//! taxonomy, typed tool requests, the host allowlist [`PolicyEngine`], and the
//! per-tool [`SlidingWindowLimiter`]. Nothing here performs network I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod envelope;
pub mod hashing;
pub mod policy;
pub mod rate_limit;
pub mod tool;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::Envelope;
pub use envelope::ErrorCode;
pub use envelope::ErrorObject;
pub use envelope::SourceMeta;
pub use envelope::Timings;
pub use hashing::content_hash;
pub use policy::AllowlistSnapshot;
pub use policy::AllowlistSource;
pub use policy::PolicyEngine;
pub use policy::PolicyError;
pub use policy::target_hostname;
pub use rate_limit::RATE_WINDOW;
pub use rate_limit::SlidingWindowLimiter;
pub use tool::BackendMode;
pub use tool::FetchInputs;
pub use tool::RequestError;
pub use tool::RequestLabels;
pub use tool::SearchInputs;
pub use tool::ToolName;
pub use tool::ToolRequest;
pub use tool::WebFetchRequest;
pub use tool::WebSearchRequest;
