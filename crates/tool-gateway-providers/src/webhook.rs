// crates/tool-gateway-providers/src/webhook.rs
// ============================================================================
// Module: Backend Forwarder
// Description: JSON webhook client for the remote automation backend.
// Purpose: Forward a tool request and return the backend's raw JSON reply.
// Dependencies: async-trait, reqwest, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! [`WebhookForwarder`] POSTs one JSON payload per call and never follows
//! redirects. A non-2xx reply is an [`UpstreamError::Status`] whatever its
//! size, carrying at most the byte cap of its body. A 2xx reply must be a JSON
//! object no larger than the byte cap; anything else is an [`UpstreamError`]. Normalization of the reply into
//! envelope data happens in [`crate::normalize`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::UpstreamError;
use crate::fetch::read_body_limited;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the shared secret to the backend.
pub const SHARED_SECRET_HEADER: &str = "X-Tool-Secret";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One webhook invocation.
#[derive(Debug, Clone, Copy)]
pub struct WebhookCall<'a> {
    /// Webhook URL.
    pub endpoint: &'a str,
    /// JSON payload to post.
    pub payload: &'a Value,
    /// Deadline covering connect, headers, and body.
    pub timeout: Duration,
    /// Optional shared secret sent as [`SHARED_SECRET_HEADER`].
    pub secret: Option<&'a str>,
    /// Maximum reply size in bytes.
    pub max_response_bytes: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Forwards tool requests to the automation backend.
#[async_trait]
pub trait BackendForwarder: Send + Sync {
    /// Posts the call payload and returns the reply object.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on timeout, non-2xx status, oversize reply,
    /// non-object reply, or transport failure.
    async fn forward(&self, call: WebhookCall<'_>) -> Result<Map<String, Value>, UpstreamError>;
}

// ============================================================================
// SECTION: Webhook Forwarder
// ============================================================================

/// reqwest-backed [`BackendForwarder`].
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    /// Shared connection pool.
    client: Client,
}

impl WebhookForwarder {
    /// Builds a forwarder with redirects disabled.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Transport`] when the client cannot be built.
    pub fn new() -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|err| UpstreamError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
        })
    }
}

#[async_trait]
impl BackendForwarder for WebhookForwarder {
    async fn forward(&self, call: WebhookCall<'_>) -> Result<Map<String, Value>, UpstreamError> {
        let exchange = async {
            let mut request = self.client.post(call.endpoint).json(call.payload).timeout(call.timeout);
            if let Some(secret) = call.secret {
                request = request.header(SHARED_SECRET_HEADER, secret);
            }
            let mut response = request.send().await.map_err(|err| UpstreamError::from_reqwest(&err))?;
            let status = response.status();
            if !status.is_success() {
                let body = read_body_limited(&mut response, call.max_response_bytes).await?;
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    body: error_body(&body.bytes),
                });
            }
            if let Some(declared) = response.content_length()
                && !usize::try_from(declared).is_ok_and(|declared| declared <= call.max_response_bytes)
            {
                return Err(UpstreamError::TooLarge {
                    limit: call.max_response_bytes,
                });
            }
            let body = read_body_limited(&mut response, call.max_response_bytes.saturating_add(1)).await?;
            if body.bytes.len() > call.max_response_bytes {
                return Err(UpstreamError::TooLarge {
                    limit: call.max_response_bytes,
                });
            }
            parse_reply(&body.bytes)
        };
        let outcome = tokio::time::timeout(call.timeout, exchange)
            .await
            .map_err(|_| UpstreamError::Timeout)
            .and_then(|result| result);
        if let Err(err) = &outcome {
            tracing::warn!(endpoint = call.endpoint, error = %err, "webhook call failed");
        }
        outcome
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an error reply as JSON, falling back to `{"text": body}`.
fn error_body(bytes: &[u8]) -> Value {
    serde_json::from_slice::<Value>(bytes)
        .unwrap_or_else(|_| json!({ "text": String::from_utf8_lossy(bytes) }))
}

/// Parses a success reply, which must be a JSON object.
fn parse_reply(bytes: &[u8]) -> Result<Map<String, Value>, UpstreamError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(UpstreamError::InvalidBody("reply is not a json object".to_string())),
        Err(err) => Err(UpstreamError::InvalidBody(err.to_string())),
    }
}
