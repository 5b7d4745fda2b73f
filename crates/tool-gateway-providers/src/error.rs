// crates/tool-gateway-providers/src/error.rs
// ============================================================================
// Module: Upstream Errors
// Description: Failure classification for outbound calls.
// Purpose: Map transport outcomes onto the gateway error taxonomy.
// Dependencies: tool-gateway-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every outbound failure is one [`UpstreamError`] variant, and each variant
//! maps to exactly one [`ErrorCode`] and HTTP status.

use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tool_gateway_core::ErrorCode;

/// Outbound call failures.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The per-call deadline elapsed.
    #[error("upstream request timed out")]
    Timeout,
    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Status {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream body as JSON, or `{"text": body}` when not JSON.
        body: Value,
    },
    /// The upstream reply exceeded the byte cap.
    #[error("upstream response exceeded {limit} bytes")]
    TooLarge {
        /// Configured cap in bytes.
        limit: usize,
    },
    /// A 2xx reply was not a JSON object.
    #[error("upstream returned an invalid body: {0}")]
    InvalidBody(String),
    /// Connection, TLS, or client construction failure.
    #[error("upstream transport failure: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Returns the error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout => ErrorCode::UpstreamTimeout,
            Self::Status {
                status, ..
            } => ErrorCode::from_upstream_status(*status),
            Self::TooLarge {
                ..
            } => ErrorCode::UpstreamTooLarge,
            Self::InvalidBody(_) => ErrorCode::UpstreamError,
            Self::Transport(_) => ErrorCode::InternalError,
        }
    }

    /// Returns the HTTP status the gateway answers with.
    ///
    /// Upstream statuses pass through unchanged.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Status {
                status, ..
            } => *status,
            _ => self.code().default_status(),
        }
    }

    /// Returns the caller-facing message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Timeout => "Upstream request timed out.",
            Self::Status {
                ..
            } => "Upstream request failed.",
            Self::TooLarge {
                ..
            } => "Upstream response exceeded byte limit.",
            Self::InvalidBody(_) => "Upstream returned an invalid response body.",
            Self::Transport(_) => "Unexpected server error.",
        }
    }

    /// Returns structured details for the error envelope.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Timeout => None,
            Self::Status {
                body, ..
            } => Some(body.clone()),
            Self::TooLarge {
                limit,
            } => Some(json!({ "limit_bytes": limit })),
            Self::InvalidBody(message) | Self::Transport(message) => Some(json!({ "error": message })),
        }
    }

    /// Classifies a reqwest failure.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
