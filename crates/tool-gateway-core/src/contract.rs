// crates/tool-gateway-core/src/contract.rs
// ============================================================================
// Module: Tool Contract Schemas
// Description: JSON Schema builders for tool request and response bodies.
// Purpose: Publish the fixed wire contract the gateway's bodies satisfy.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Draft 2020-12 schemas for `web.fetch` and `web.search` request and response
//! bodies. Response schemas describe the full [`crate::Envelope`], including
//! the failure shape, so any body the gateway emits for a tool validates
//! against its tool's response schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::envelope::ErrorCode;
use crate::tool::BackendMode;
use crate::tool::DEFAULT_MAX_RESULTS;
use crate::tool::ToolName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON Schema dialect used by every contract schema.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Every error code in the taxonomy, in wire form.
const ERROR_CODES: [ErrorCode; 11] = [
    ErrorCode::BadRequest,
    ErrorCode::PolicyDenied,
    ErrorCode::RateLimited,
    ErrorCode::Unauthorized,
    ErrorCode::UpstreamBadRequest,
    ErrorCode::UpstreamRateLimited,
    ErrorCode::UpstreamError,
    ErrorCode::UpstreamTimeout,
    ErrorCode::UpstreamTooLarge,
    ErrorCode::NotConfigured,
    ErrorCode::InternalError,
];

// ============================================================================
// SECTION: Schema Kinds
// ============================================================================

/// Which side of a tool call a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Request body.
    Request,
    /// Response envelope.
    Response,
}

impl SchemaKind {
    /// Returns the stable label used in schema file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// Returns the conventional file name for a schema, e.g.
/// `web.fetch.request.schema.json`.
#[must_use]
pub fn schema_file_name(tool: ToolName, kind: SchemaKind) -> String {
    format!("{}.{}.schema.json", tool.as_str(), kind.as_str())
}

/// Returns the schema for a tool and side.
#[must_use]
pub fn tool_schema(tool: ToolName, kind: SchemaKind) -> Value {
    match kind {
        SchemaKind::Request => request_schema(tool),
        SchemaKind::Response => response_schema(tool),
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Returns the request body schema for `tool`.
#[must_use]
pub fn request_schema(tool: ToolName) -> Value {
    let inputs = match tool {
        ToolName::WebFetch => json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": { "type": "string", "description": "Absolute URL to fetch." }
            }
        }),
        ToolName::WebSearch => json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": { "type": "string", "description": "Search query text." },
                "max_results": {
                    "type": "integer",
                    "minimum": 0,
                    "default": DEFAULT_MAX_RESULTS
                }
            }
        }),
    };
    json!({
        "$schema": SCHEMA_DIALECT,
        "$id": schema_id(tool, SchemaKind::Request),
        "title": format!("{} request", tool.as_str()),
        "type": "object",
        "required": ["agent_id", "purpose", "inputs"],
        "properties": {
            "agent_id": { "type": "string", "description": "Caller-supplied agent label." },
            "purpose": { "type": "string", "description": "Caller-stated purpose." },
            "request_id": { "type": ["string", "null"] },
            "inputs": inputs
        }
    })
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Returns the response envelope schema for `tool`.
#[must_use]
pub fn response_schema(tool: ToolName) -> Value {
    let data = match tool {
        ToolName::WebFetch => fetch_data_schema(),
        ToolName::WebSearch => search_data_schema(),
    };
    let codes: Vec<&str> = ERROR_CODES.iter().map(|code| code.as_str()).collect();
    let backends = [BackendMode::Local.as_str(), BackendMode::N8n.as_str()];
    json!({
        "$schema": SCHEMA_DIALECT,
        "$id": schema_id(tool, SchemaKind::Response),
        "title": format!("{} response envelope", tool.as_str()),
        "type": "object",
        "required": ["ok", "data", "error", "source_meta", "timings_ms", "content_hash"],
        "properties": {
            "ok": { "type": "boolean" },
            "data": { "type": "object" },
            "error": {
                "oneOf": [
                    { "type": "null" },
                    { "$ref": "#/$defs/ErrorObject" }
                ]
            },
            "source_meta": {
                "type": "object",
                "required": ["tool", "backend"],
                "properties": {
                    "tool": { "const": tool.as_str() },
                    "backend": { "enum": backends }
                }
            },
            "timings_ms": {
                "type": "object",
                "additionalProperties": { "type": "number", "minimum": 0 }
            },
            "content_hash": {
                "oneOf": [
                    { "type": "null" },
                    { "type": "string", "pattern": "^[0-9a-f]{64}$" }
                ]
            }
        },
        "if": { "properties": { "ok": { "const": true } } },
        "then": {
            "properties": {
                "error": { "type": "null" },
                "data": { "$ref": "#/$defs/Data" }
            }
        },
        "else": {
            "properties": {
                "error": { "$ref": "#/$defs/ErrorObject" },
                "data": { "type": "object", "maxProperties": 0 }
            }
        },
        "$defs": {
            "Data": data,
            "ErrorObject": {
                "type": "object",
                "required": ["code", "message"],
                "properties": {
                    "code": { "enum": codes },
                    "message": { "type": "string" },
                    "details": {}
                }
            }
        }
    })
}

/// Schema for `web.fetch` success data.
fn fetch_data_schema() -> Value {
    json!({
        "type": "object",
        "required": ["url", "final_url", "status", "title", "extracted_text", "fetched_at"],
        "minProperties": 1,
        "properties": {
            "url": { "type": "string" },
            "final_url": { "type": "string" },
            "status": { "type": "integer" },
            "title": { "type": "string" },
            "extracted_text": { "type": "string" },
            "fetched_at": { "type": "string" }
        }
    })
}

/// Schema for `web.search` success data.
fn search_data_schema() -> Value {
    json!({
        "type": "object",
        "required": ["query", "results", "searched_at"],
        "properties": {
            "query": { "type": "string" },
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["title", "url", "snippet", "source"],
                    "properties": {
                        "title": { "type": "string" },
                        "url": { "type": "string" },
                        "snippet": { "type": "string" },
                        "source": { "type": "string" },
                        "published_at": { "type": ["string", "null"] }
                    }
                }
            },
            "searched_at": { "type": "string" }
        }
    })
}

/// Builds a stable schema identifier.
fn schema_id(tool: ToolName, kind: SchemaKind) -> String {
    format!("tool-gateway://contract/schemas/tools/{}", schema_file_name(tool, kind))
}
