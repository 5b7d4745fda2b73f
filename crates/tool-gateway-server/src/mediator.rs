// crates/tool-gateway-server/src/mediator.rs
// ============================================================================
// Module: Request Mediator
// Description: The tool call pipeline from raw body to audited envelope.
// Purpose: Enforce validation, rate limits, and host policy before dispatch.
// Dependencies: tool-gateway-{config,core,providers}, serde_json, time, tracing
// ============================================================================

//! ## Overview
//! Each call moves through validate, rate-limit, policy check (fetch only),
//! dispatch, and normalize, and may stop early with an error envelope. No
//! stage retries. Whatever the outcome, exactly one audit event is recorded
//! after the response body is serialized and before it is returned.
//!
//! ## Invariants
//! - No outbound request is made for a call denied by validation, rate
//!   limiting, or policy.
//! - The rate limit is read from the current configuration on every call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Instant;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use tool_gateway_config::ConfigError;
use tool_gateway_config::GatewayConfig;
use tool_gateway_core::BackendMode;
use tool_gateway_core::Envelope;
use tool_gateway_core::ErrorCode;
use tool_gateway_core::ErrorObject;
use tool_gateway_core::PolicyEngine;
use tool_gateway_core::RequestLabels;
use tool_gateway_core::SlidingWindowLimiter;
use tool_gateway_core::SourceMeta;
use tool_gateway_core::Timings;
use tool_gateway_core::ToolName;
use tool_gateway_core::WebFetchRequest;
use tool_gateway_core::WebSearchRequest;
use tool_gateway_core::envelope::round_ms;
use tool_gateway_core::target_hostname;
use tool_gateway_providers::BackendForwarder;
use tool_gateway_providers::FetchLimits;
use tool_gateway_providers::FetchOutcome;
use tool_gateway_providers::Normalized;
use tool_gateway_providers::UpstreamError;
use tool_gateway_providers::WebFetcher;
use tool_gateway_providers::WebhookCall;
use tool_gateway_providers::normalize_fetch;
use tool_gateway_providers::normalize_search;
use tool_gateway_providers::timestamp;

use crate::audit::AuditDecision;
use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::REASON_OK;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "tool-gateway";

/// Body returned if an envelope cannot be serialized.
const FALLBACK_BODY: &[u8] = br#"{"ok":false,"data":{},"error":{"code":"INTERNAL_ERROR","message":"Unexpected server error.","details":null},"source_meta":{},"timings_ms":{},"content_hash":null}"#;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Completed tool response.
#[derive(Debug, Clone)]
pub struct ToolResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response envelope.
    pub envelope: Envelope,
    /// Serialized envelope.
    pub body: Vec<u8>,
}

impl ToolResponse {
    /// Serializes an envelope into a response.
    fn new(status: u16, envelope: Envelope) -> Self {
        let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| FALLBACK_BODY.to_vec());
        Self {
            status,
            envelope,
            body,
        }
    }
}

/// Per-call state accumulated across pipeline stages.
struct CallState {
    /// Tool being invoked.
    tool: ToolName,
    /// Backend active at call start.
    backend: BackendMode,
    /// Validation start.
    started: Instant,
    /// Request body size.
    bytes_in: usize,
    /// Caller labels.
    labels: RequestLabels,
    /// Target URL once validated.
    url: Option<String>,
    /// Target hostname once extracted.
    domain: Option<String>,
    /// Stage timings; `total` is added at finish.
    timings: Timings,
}

impl CallState {
    /// Starts a call for `tool` over a raw body.
    fn start(tool: ToolName, backend: BackendMode, body: &[u8]) -> Self {
        Self {
            tool,
            backend,
            started: Instant::now(),
            bytes_in: body.len(),
            labels: RequestLabels::peek(body),
            url: None,
            domain: None,
            timings: Timings::new(),
        }
    }

    /// Returns source metadata for this call.
    const fn source_meta(&self) -> SourceMeta {
        SourceMeta::tool(self.tool, self.backend)
    }
}

// ============================================================================
// SECTION: Mediator
// ============================================================================

/// Tool call pipeline.
pub struct RequestMediator {
    /// Current configuration snapshot.
    config: RwLock<Arc<GatewayConfig>>,
    /// Host allowlist policy.
    policy: Arc<PolicyEngine>,
    /// Per-tool rate limiter.
    limiter: SlidingWindowLimiter,
    /// Local fetcher.
    fetcher: Arc<dyn WebFetcher>,
    /// Remote backend forwarder.
    forwarder: Arc<dyn BackendForwarder>,
    /// Audit destination.
    audit: Arc<dyn AuditSink>,
}

impl RequestMediator {
    /// Assembles a mediator from its collaborators.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        policy: Arc<PolicyEngine>,
        fetcher: Arc<dyn WebFetcher>,
        forwarder: Arc<dyn BackendForwarder>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            policy,
            limiter: SlidingWindowLimiter::new(),
            fetcher,
            forwarder,
            audit,
        }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> Arc<GatewayConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the configuration after validating it.
    ///
    /// The allowlist is not re-read; use [`PolicyEngine::reload`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the new configuration is invalid; the
    /// current configuration stays active.
    pub fn reconfigure(&self, config: GatewayConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
        drop(guard);
        Ok(())
    }

    /// Returns the host policy engine.
    #[must_use]
    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    // ------------------------------------------------------------------------
    // Tools
    // ------------------------------------------------------------------------

    /// Handles a `web.fetch` call.
    pub async fn web_fetch(&self, body: &[u8]) -> ToolResponse {
        let config = self.config();
        let mut call = CallState::start(ToolName::WebFetch, config.backend, body);
        let request = match WebFetchRequest::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                let error = ErrorObject::new(ErrorCode::BadRequest, "Invalid payload.").with_details(err.details());
                return self.fail(call, 400, error);
            }
        };
        call.url = Some(request.inputs.url.clone());
        let mut call = match self.check_rate(call, &config) {
            Ok(call) => call,
            Err(limited) => return limited,
        };
        let Some(hostname) = target_hostname(&request.inputs.url) else {
            let error = ErrorObject::new(ErrorCode::BadRequest, "Invalid URL.")
                .with_details(json!({ "field": "inputs.url" }));
            return self.fail(call, 400, error);
        };
        call.domain = Some(hostname.clone());
        if !self.policy.is_allowed_host(&hostname) {
            let error = ErrorObject::new(ErrorCode::PolicyDenied, "Hostname is not allowlisted.")
                .with_details(json!({ "hostname": hostname }));
            return self.fail(call, 403, error);
        }

        match config.backend {
            BackendMode::Local => self.fetch_local(call, &config, request).await,
            BackendMode::N8n => {
                let Some(endpoint) = config.webhook_url(ToolName::WebFetch) else {
                    return self.not_configured(call, "Fetch backend is not configured.");
                };
                let payload = json!({
                    "url": request.inputs.url,
                    "agent_id": request.agent_id,
                    "purpose": request.purpose,
                    "request_id": request.request_id,
                });
                match self.forward(&config, endpoint, &payload).await {
                    Ok(reply) => {
                        let outcome = FetchOutcome::Remote {
                            requested_url: request.inputs.url,
                            reply,
                        };
                        self.succeed(call, normalize_fetch(outcome, OffsetDateTime::now_utc()))
                    }
                    Err(err) => self.upstream_failure(call, &err),
                }
            }
        }
    }

    /// Handles a `web.search` call.
    pub async fn web_search(&self, body: &[u8]) -> ToolResponse {
        let config = self.config();
        let call = CallState::start(ToolName::WebSearch, config.backend, body);
        let request = match WebSearchRequest::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                let error = ErrorObject::new(ErrorCode::BadRequest, "Invalid payload.").with_details(err.details());
                return self.fail(call, 400, error);
            }
        };
        let call = match self.check_rate(call, &config) {
            Ok(call) => call,
            Err(limited) => return limited,
        };

        let endpoint = match config.backend {
            BackendMode::Local => None,
            BackendMode::N8n => config.webhook_url(ToolName::WebSearch),
        };
        let Some(endpoint) = endpoint else {
            return self.not_configured(call, "Search backend is not configured.");
        };
        let payload = json!({
            "query": request.inputs.query,
            "max_results": request.inputs.max_results,
            "agent_id": request.agent_id,
            "purpose": request.purpose,
            "request_id": request.request_id,
        });
        match self.forward(&config, endpoint, &payload).await {
            Ok(reply) => {
                let normalized = normalize_search(&request.inputs.query, &reply, OffsetDateTime::now_utc());
                self.succeed(call, normalized)
            }
            Err(err) => self.upstream_failure(call, &err),
        }
    }

    /// Answers a call whose body could not be read, such as one over the
    /// body size cap.
    #[must_use]
    pub fn reject_body(&self, tool: ToolName, bytes_in: usize, reason: &str) -> ToolResponse {
        let mut call = CallState::start(tool, self.config().backend, &[]);
        call.bytes_in = bytes_in;
        let error = ErrorObject::new(ErrorCode::BadRequest, "Invalid payload.")
            .with_details(json!({ "errors": [{ "field": null, "message": reason }] }));
        self.fail(call, 400, error)
    }

    /// Answers a call whose handler failed unexpectedly.
    #[must_use]
    pub fn internal_error(&self, tool: ToolName, bytes_in: usize, reason: &str) -> ToolResponse {
        let mut call = CallState::start(tool, self.config().backend, &[]);
        call.bytes_in = bytes_in;
        let error = ErrorObject::new(ErrorCode::InternalError, "Unexpected server error.")
            .with_details(json!({ "error": reason }));
        self.fail(call, 500, error)
    }

    /// Returns the health envelope; not audited.
    #[must_use]
    pub fn health(&self) -> ToolResponse {
        let started = Instant::now();
        let mut data = Map::new();
        data.insert("status".to_string(), Value::String("healthy".to_string()));
        data.insert("service".to_string(), Value::String(SERVICE_NAME.to_string()));
        let mut timings = Timings::new();
        timings.record("total", started.elapsed());
        let envelope = Envelope::success(data, SourceMeta::backend(self.config().backend), timings, None);
        ToolResponse::new(200, envelope)
    }

    // ------------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------------

    /// Applies the per-tool rate limit, handing the call back when admitted.
    fn check_rate(&self, call: CallState, config: &GatewayConfig) -> Result<CallState, ToolResponse> {
        let limit = config.rate_limit_per_minute;
        if self.limiter.allow(call.tool.as_str(), limit) {
            return Ok(call);
        }
        let error = ErrorObject::new(ErrorCode::RateLimited, "Tool rate limit exceeded.")
            .with_details(json!({ "limit_per_minute": limit }));
        Err(self.fail(call, 429, error))
    }

    /// Runs the local fetcher.
    async fn fetch_local(
        &self,
        mut call: CallState,
        config: &GatewayConfig,
        request: WebFetchRequest,
    ) -> ToolResponse {
        let limits = FetchLimits {
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            user_agent: config.user_agent.clone(),
        };
        let fetch_started = Instant::now();
        let fetched = self.fetcher.fetch(&request.inputs.url, &limits).await;
        call.timings.record("fetch", fetch_started.elapsed());
        match fetched {
            Ok(result) => {
                let outcome = FetchOutcome::Local {
                    requested_url: request.inputs.url,
                    result,
                };
                self.succeed(call, normalize_fetch(outcome, OffsetDateTime::now_utc()))
            }
            Err(err) => self.upstream_failure(call, &err),
        }
    }

    /// Posts to a webhook with the configured secret and limits.
    async fn forward(
        &self,
        config: &GatewayConfig,
        endpoint: &str,
        payload: &Value,
    ) -> Result<Map<String, Value>, UpstreamError> {
        self.forwarder
            .forward(WebhookCall {
                endpoint,
                payload,
                timeout: config.timeout(),
                secret: config.shared_secret.as_ref().map(|secret| secret.expose()),
                max_response_bytes: config.max_bytes,
            })
            .await
    }

    // ------------------------------------------------------------------------
    // Outcomes
    // ------------------------------------------------------------------------

    /// Finishes with a success envelope.
    fn succeed(&self, call: CallState, normalized: Normalized) -> ToolResponse {
        self.finish(call, 200, |source_meta, timings| {
            Envelope::success(normalized.data, source_meta, timings, normalized.content_hash)
        })
    }

    /// Finishes with a soft `NOT_CONFIGURED` envelope.
    fn not_configured(&self, call: CallState, message: &str) -> ToolResponse {
        self.fail(call, ErrorCode::NotConfigured.default_status(), ErrorObject::new(ErrorCode::NotConfigured, message))
    }

    /// Finishes with an upstream failure envelope.
    fn upstream_failure(&self, call: CallState, err: &UpstreamError) -> ToolResponse {
        tracing::warn!(
            tool = call.tool.as_str(),
            backend = call.backend.as_str(),
            code = err.code().as_str(),
            error = %err,
            "upstream call failed"
        );
        let mut error = ErrorObject::new(err.code(), err.message());
        error.details = err.details();
        self.fail(call, err.http_status(), error)
    }

    /// Finishes with a failure envelope.
    fn fail(&self, call: CallState, status: u16, error: ErrorObject) -> ToolResponse {
        self.finish(call, status, |source_meta, timings| Envelope::failure(error, source_meta, timings))
    }

    /// Records total time, serializes the envelope, and emits the audit event.
    fn finish<F>(&self, mut call: CallState, status: u16, build: F) -> ToolResponse
    where
        F: FnOnce(SourceMeta, Timings) -> Envelope,
    {
        let elapsed = call.started.elapsed();
        call.timings.record("total", elapsed);
        let source_meta = call.source_meta();
        let response = ToolResponse::new(status, build(source_meta, call.timings));
        let error_code = response.envelope.error_code();
        let event = AuditEvent {
            timestamp: timestamp(OffsetDateTime::now_utc()),
            tool_name: call.tool,
            decision: AuditDecision::for_outcome(error_code),
            reason_code: error_code.map_or_else(|| REASON_OK.to_string(), |code| code.as_str().to_string()),
            domain: call.domain,
            url: call.url,
            http_status: status,
            duration_ms: round_ms(elapsed),
            bytes_in: call.bytes_in,
            bytes_out: response.body.len(),
            requester: call.labels.requester,
            correlation_id: call.labels.correlation_id,
            upstream: call.backend,
            error_code,
        };
        tracing::debug!(
            tool = event.tool_name.as_str(),
            reason_code = %event.reason_code,
            http_status = status,
            duration_ms = event.duration_ms,
            "tool call finished"
        );
        self.audit.record(&event);
        response
    }
}
