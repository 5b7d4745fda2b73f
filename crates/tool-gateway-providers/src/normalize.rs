// crates/tool-gateway-providers/src/normalize.rs
// ============================================================================
// Module: Upstream Normalization
// Description: Maps local and remote tool outcomes onto envelope data.
// Purpose: Give both backends one canonical success data shape.
// Dependencies: tool-gateway-core, serde_json, time
// ============================================================================

//! ## Overview
//! Local fetches produce a typed [`FetchResult`]; the remote backend produces a
//! loosely shaped JSON object. [`FetchOutcome`] tags the two and
//! [`normalize_fetch`] fills the same data keys from either. Missing
//! timestamps default to `now`; a missing or empty `final_url` defaults to
//! the requested URL. Remote fields are coerced to the published types:
//! `status` becomes an integer and search results always carry string
//! `title`, `url`, `snippet`, and `source`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tool_gateway_core::content_hash;

use crate::fetch::FetchResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Text fields every normalized search result carries.
const RESULT_TEXT_FIELDS: [&str; 4] = ["title", "url", "snippet", "source"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// A `web.fetch` outcome from either backend.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Result of the in-process fetcher.
    Local {
        /// URL the caller asked for.
        requested_url: String,
        /// Fetcher result.
        result: FetchResult,
    },
    /// Raw reply object from the remote backend.
    Remote {
        /// URL the caller asked for.
        requested_url: String,
        /// Backend reply.
        reply: Map<String, Value>,
    },
}

/// Normalized success data plus its content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Envelope `data` map.
    pub data: Map<String, Value>,
    /// SHA-256 hex of non-empty `extracted_text`; fetch only.
    pub content_hash: Option<String>,
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes a fetch outcome into
/// `{url, final_url, status, title, extracted_text, fetched_at}`.
#[must_use]
pub fn normalize_fetch(outcome: FetchOutcome, now: OffsetDateTime) -> Normalized {
    let (url, final_url, status, title, text, fetched_at) = match outcome {
        FetchOutcome::Local {
            requested_url,
            result,
        } => (
            requested_url,
            Some(result.final_url),
            Value::from(result.status_code),
            result.title,
            result.extracted_text,
            None,
        ),
        FetchOutcome::Remote {
            requested_url,
            reply,
        } => (
            non_empty_str(reply.get("url")).map_or(requested_url, str::to_string),
            non_empty_str(reply.get("final_url")).map(str::to_string),
            Value::from(status_code(reply.get("status"))),
            text_field(reply.get("title")),
            text_field(reply.get("extracted_text")),
            non_empty_str(reply.get("fetched_at")).map(str::to_string),
        ),
    };
    let final_url = final_url.filter(|value| !value.is_empty()).unwrap_or_else(|| url.clone());
    let hash = content_hash(&text);
    let mut data = Map::new();
    data.insert("url".to_string(), Value::String(url));
    data.insert("final_url".to_string(), Value::String(final_url));
    data.insert("status".to_string(), status);
    data.insert("title".to_string(), Value::String(title));
    data.insert("extracted_text".to_string(), Value::String(text));
    data.insert(
        "fetched_at".to_string(),
        Value::String(fetched_at.unwrap_or_else(|| timestamp(now))),
    );
    Normalized {
        data,
        content_hash: hash,
    }
}

/// Normalizes a search reply into `{query, results, searched_at}`.
#[must_use]
pub fn normalize_search(
    requested_query: &str,
    reply: &Map<String, Value>,
    now: OffsetDateTime,
) -> Normalized {
    let query = non_empty_str(reply.get("query")).unwrap_or(requested_query);
    let results = match reply.get("results") {
        Some(Value::Array(items)) => items.iter().filter_map(search_result).collect(),
        _ => Vec::new(),
    };
    let searched_at =
        non_empty_str(reply.get("searched_at")).map_or_else(|| timestamp(now), str::to_string);
    let mut data = Map::new();
    data.insert("query".to_string(), Value::String(query.to_string()));
    data.insert("results".to_string(), Value::Array(results));
    data.insert("searched_at".to_string(), Value::String(searched_at));
    Normalized {
        data,
        content_hash: None,
    }
}

/// Formats `now` as RFC 3339.
#[must_use]
pub fn timestamp(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a non-empty string value.
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// Reads an upstream status as an integer; numeric strings are parsed and
/// anything else is 0.
fn status_code(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number.as_i64().unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerces one search result into `{title, url, snippet, source,
/// published_at?}`; non-object items are dropped and missing text fields
/// become empty strings.
fn search_result(item: &Value) -> Option<Value> {
    let Value::Object(fields) = item else {
        return None;
    };
    let mut result = Map::new();
    for key in RESULT_TEXT_FIELDS {
        result.insert(key.to_string(), Value::String(text_field(fields.get(key))));
    }
    match fields.get("published_at") {
        Some(Value::String(published)) => {
            result.insert("published_at".to_string(), Value::String(published.clone()));
        }
        Some(Value::Null) => {
            result.insert("published_at".to_string(), Value::Null);
        }
        _ => {}
    }
    Some(Value::Object(result))
}

/// Renders a field as text: strings verbatim, null or missing as empty, other
/// values as compact JSON.
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
