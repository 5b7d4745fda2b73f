// crates/tool-gateway-core/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: Canonical response shape and closed error taxonomy.
// Purpose: Give every tool outcome, success or failure, one serialized form.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every gateway response body is an [`Envelope`]. Success envelopes carry a
//! non-empty `data` map and no error; failure envelopes carry an
//! [`ErrorObject`] whose code is drawn from the closed [`ErrorCode`] set.
//! All envelope fields are always serialized, including nulls, so callers can
//! rely on a fixed key set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::tool::BackendMode;
use crate::tool::ToolName;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Closed set of error codes surfaced to callers.
///
/// # Invariants
/// - Variants and their wire labels are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body failed validation.
    BadRequest,
    /// Target hostname is not allowlisted.
    PolicyDenied,
    /// Gateway rate limit exceeded for the tool.
    RateLimited,
    /// Upstream backend rejected the shared secret.
    Unauthorized,
    /// Upstream backend returned a 4xx other than 401/429.
    UpstreamBadRequest,
    /// Upstream backend returned 429.
    UpstreamRateLimited,
    /// Upstream backend failed or returned an unusable body.
    UpstreamError,
    /// Upstream deadline elapsed.
    UpstreamTimeout,
    /// Upstream reply exceeded the byte cap.
    UpstreamTooLarge,
    /// The requested backend is not configured.
    NotConfigured,
    /// Unexpected gateway failure.
    InternalError,
}

impl ErrorCode {
    /// Returns the stable wire label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::PolicyDenied => "POLICY_DENIED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UpstreamBadRequest => "UPSTREAM_BAD_REQUEST",
            Self::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::UpstreamTooLarge => "UPSTREAM_TOO_LARGE",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status used when no upstream status is passed through.
    #[must_use]
    pub const fn default_status(self) -> u16 {
        match self {
            Self::BadRequest | Self::UpstreamBadRequest => 400,
            Self::Unauthorized => 401,
            Self::PolicyDenied => 403,
            Self::RateLimited | Self::UpstreamRateLimited => 429,
            Self::UpstreamError | Self::UpstreamTooLarge => 502,
            Self::UpstreamTimeout => 504,
            Self::NotConfigured => 200,
            Self::InternalError => 500,
        }
    }

    /// Classifies a non-2xx upstream status into an error code.
    #[must_use]
    pub const fn from_upstream_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            429 => Self::UpstreamRateLimited,
            400..=499 => Self::UpstreamBadRequest,
            _ => Self::UpstreamError,
        }
    }

    /// Returns true when the code records a policy-stage denial.
    ///
    /// Denials are outcomes decided before any upstream was contacted.
    #[must_use]
    pub const fn is_denial(self) -> bool {
        matches!(self, Self::BadRequest | Self::RateLimited | Self::PolicyDenied)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload carried by failure envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error code from the closed taxonomy.
    pub code: ErrorCode,
    /// Human readable message.
    pub message: String,
    /// Optional structured details.
    pub details: Option<Value>,
}

impl ErrorObject {
    /// Creates an error object without details.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ============================================================================
// SECTION: Envelope Parts
// ============================================================================

/// Metadata identifying which tool and backend produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Tool name; absent for non-tool endpoints such as health.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolName>,
    /// Backend mode active when the response was produced.
    pub backend: BackendMode,
}

impl SourceMeta {
    /// Creates source metadata for a tool response.
    #[must_use]
    pub const fn tool(tool: ToolName, backend: BackendMode) -> Self {
        Self {
            tool: Some(tool),
            backend,
        }
    }

    /// Creates source metadata for a non-tool response.
    #[must_use]
    pub const fn backend(backend: BackendMode) -> Self {
        Self {
            tool: None,
            backend,
        }
    }
}

/// Named timing measurements in milliseconds, rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timings(BTreeMap<String, f64>);

impl Timings {
    /// Creates an empty timing map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records a duration under the given label.
    pub fn record(&mut self, label: &str, elapsed: Duration) {
        self.0.insert(label.to_string(), round_ms(elapsed));
    }

    /// Returns the recorded value for a label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }
}

/// Converts a duration to milliseconds rounded to two decimals.
#[must_use]
pub fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Canonical gateway response body.
///
/// # Invariants
/// - `ok == true` implies `error` is `None` and `data` is non-empty.
/// - `ok == false` implies `error` is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the tool call succeeded.
    pub ok: bool,
    /// Tool output; empty on failure.
    pub data: Map<String, Value>,
    /// Error payload on failure.
    pub error: Option<ErrorObject>,
    /// Tool and backend metadata.
    pub source_meta: SourceMeta,
    /// Timing measurements in milliseconds.
    pub timings_ms: Timings,
    /// SHA-256 hex digest of the extracted text, when present.
    pub content_hash: Option<String>,
}

impl Envelope {
    /// Builds a success envelope.
    #[must_use]
    pub const fn success(
        data: Map<String, Value>,
        source_meta: SourceMeta,
        timings_ms: Timings,
        content_hash: Option<String>,
    ) -> Self {
        Self {
            ok: true,
            data,
            error: None,
            source_meta,
            timings_ms,
            content_hash,
        }
    }

    /// Builds a failure envelope with empty data.
    #[must_use]
    pub fn failure(error: ErrorObject, source_meta: SourceMeta, timings_ms: Timings) -> Self {
        Self {
            ok: false,
            data: Map::new(),
            error: Some(error),
            source_meta,
            timings_ms,
            content_hash: None,
        }
    }

    /// Returns the error code for failure envelopes.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|error| error.code)
    }

    /// Returns true when the envelope satisfies its shape invariants.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if self.ok { self.error.is_none() && !self.data.is_empty() } else { self.error.is_some() }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
