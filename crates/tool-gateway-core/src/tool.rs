// crates/tool-gateway-core/src/tool.rs
// ============================================================================
// Module: Tool Requests
// Description: Tool identifiers, backend modes, and typed request bodies.
// Purpose: Validate untrusted request bodies into immutable tool requests.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Tool requests arrive as untrusted JSON. [`ToolRequest::from_slice`] accepts
//! only a JSON object matching the tool's input shape and produces an
//! immutable request. `agent_id` is a caller-supplied label, not an identity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of search results when the caller omits `max_results`.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Tools exposed by the gateway.
///
/// # Invariants
/// - Wire names are stable; they also key the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolName {
    /// Fetch a single URL.
    #[serde(rename = "web.fetch")]
    WebFetch,
    /// Run a web search.
    #[serde(rename = "web.search")]
    WebSearch,
}

impl ToolName {
    /// Returns the stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebFetch => "web.fetch",
            Self::WebSearch => "web.search",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "web.fetch" => Ok(Self::WebFetch),
            "web.search" => Ok(Self::WebSearch),
            other => Err(RequestError::UnknownTool(other.to_string())),
        }
    }
}

/// Backend that executes tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// In-process fetcher; search is not available.
    #[default]
    Local,
    /// Remote n8n webhooks.
    N8n,
}

impl BackendMode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::N8n => "n8n",
        }
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendMode {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "n8n" => Ok(Self::N8n),
            other => Err(RequestError::UnknownBackend(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Body is not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(String),
    /// Body is JSON but not an object.
    #[error("request body must be a json object")]
    NotAnObject,
    /// Body does not match the tool input shape.
    #[error("invalid payload: {0}")]
    InvalidShape(String),
    /// Unrecognized tool name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Unrecognized backend mode.
    #[error("unknown backend mode: {0}")]
    UnknownBackend(String),
}

impl RequestError {
    /// Returns the structured details attached to `BAD_REQUEST` envelopes.
    #[must_use]
    pub fn details(&self) -> Value {
        serde_json::json!({
            "errors": [{ "field": null, "message": self.to_string() }]
        })
    }
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Inputs for `web.fetch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchInputs {
    /// Absolute URL to fetch.
    pub url: String,
}

/// Inputs for `web.search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInputs {
    /// Search query text.
    pub query: String,
    /// Maximum number of results to return.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

/// Serde default for [`SearchInputs::max_results`].
const fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Validated tool request.
///
/// # Invariants
/// - Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest<I> {
    /// Caller-supplied agent label.
    pub agent_id: String,
    /// Caller-stated purpose.
    pub purpose: String,
    /// Optional caller correlation identifier.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Tool-specific inputs.
    pub inputs: I,
}

/// Validated `web.fetch` request.
pub type WebFetchRequest = ToolRequest<FetchInputs>;
/// Validated `web.search` request.
pub type WebSearchRequest = ToolRequest<SearchInputs>;

impl<I: DeserializeOwned> ToolRequest<I> {
    /// Parses and validates a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the body is not a JSON object matching the
    /// tool input shape.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| RequestError::InvalidJson(err.to_string()))?;
        Self::from_value(value)
    }

    /// Validates an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the value does not match the tool input shape.
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        if !value.is_object() {
            return Err(RequestError::NotAnObject);
        }
        serde_json::from_value(value).map_err(|err| RequestError::InvalidShape(err.to_string()))
    }
}

/// Identity labels recovered from a body for audit purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLabels {
    /// `agent_id` when present as a string.
    pub requester: Option<String>,
    /// `request_id` when present as a string.
    pub correlation_id: Option<String>,
}

impl RequestLabels {
    /// Extracts labels from a body without validating it.
    #[must_use]
    pub fn peek(bytes: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) else {
            return Self::default();
        };
        let label = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            requester: label("agent_id"),
            correlation_id: label("request_id"),
        }
    }
}
