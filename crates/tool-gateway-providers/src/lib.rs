// crates/tool-gateway-providers/src/lib.rs
// ============================================================================
// Module: Tool Gateway Providers Library
// Description: Outbound fetch and webhook forwarding for tool calls.
// Purpose: Expose the local fetcher, backend forwarder, and normalization.
// Dependencies: crate::{error, extract, fetch, normalize, webhook}
// ============================================================================

//! ## Overview
//! Providers perform the single outbound call a tool request may make. The
//! [`HttpFetcher`] retrieves a page and extracts plain text; the
//! [`WebhookForwarder`] posts to an automation backend. Both enforce a
//! per-call deadline and a byte cap, and both report failures as
//! [`UpstreamError`]. [`normalize`] turns either outcome into envelope data.
//! Security posture: providers never decide policy; callers must check the
//! allowlist before invoking them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod webhook;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::UpstreamError;
pub use extract::MAX_EXTRACTED_CHARS;
pub use extract::extract_text;
pub use extract::extract_title;
pub use fetch::FetchLimits;
pub use fetch::FetchResult;
pub use fetch::HttpFetcher;
pub use fetch::WebFetcher;
pub use normalize::FetchOutcome;
pub use normalize::Normalized;
pub use normalize::normalize_fetch;
pub use normalize::normalize_search;
pub use normalize::timestamp;
pub use webhook::BackendForwarder;
pub use webhook::SHARED_SECRET_HEADER;
pub use webhook::WebhookCall;
pub use webhook::WebhookForwarder;
