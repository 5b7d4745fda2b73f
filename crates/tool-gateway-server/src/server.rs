// crates/tool-gateway-server/src/server.rs
// ============================================================================
// Module: Gateway HTTP Server
// Description: axum routes for the tool endpoints and health check.
// Purpose: Expose the request mediator over HTTP with graceful shutdown.
// Dependencies: axum, tokio, tool-gateway-{config,core,providers}, tracing
// ============================================================================

//! ## Overview
//! Routes:
//! - `POST /tools/web.fetch`
//! - `POST /tools/web.search`
//! - `GET /health`
//!
//! Every response body is an envelope, including bodies rejected for size.
//! Each tool call runs on its own task so a disconnecting client cannot cancel
//! the call before its audit event is recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_LENGTH;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tool_gateway_config::GatewayConfig;
use tool_gateway_core::PolicyEngine;
use tool_gateway_core::ToolName;
use tool_gateway_providers::HttpFetcher;
use tool_gateway_providers::WebhookForwarder;

use crate::audit::audit_sink_from_config;
use crate::mediator::RequestMediator;
use crate::mediator::ToolResponse;

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// HTTP gateway instance.
pub struct GatewayServer {
    /// Listen address.
    bind: SocketAddr,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
    /// Shared call pipeline.
    mediator: Arc<RequestMediator>,
}

impl GatewayServer {
    /// Builds a server with the production fetcher, forwarder, and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration is invalid, the
    /// allowlist cannot be read, or an HTTP client cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let policy = PolicyEngine::load(config.allowlist.clone())
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let fetcher = HttpFetcher::new().map_err(|err| ServerError::Init(err.to_string()))?;
        let forwarder = WebhookForwarder::new().map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = audit_sink_from_config(config.audit_log_path.as_deref());
        let allowlisted = policy.snapshot().len();
        if allowlisted == 0 {
            tracing::warn!("allowlist is empty; every web.fetch call will be denied");
        }
        tracing::info!(
            backend = config.backend.as_str(),
            allowlisted_hosts = allowlisted,
            rate_limit_per_minute = config.rate_limit_per_minute,
            "gateway configured"
        );
        let bind = config.bind;
        let max_body_bytes = config.max_body_bytes;
        let mediator = RequestMediator::new(
            config,
            Arc::new(policy),
            Arc::new(fetcher),
            Arc::new(forwarder),
            audit,
        );
        Ok(Self {
            bind,
            max_body_bytes,
            mediator: Arc::new(mediator),
        })
    }

    /// Returns the shared mediator.
    #[must_use]
    pub const fn mediator(&self) -> &Arc<RequestMediator> {
        &self.mediator
    }

    /// Builds the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.mediator), self.max_body_bytes)
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight calls complete before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "tool gateway listening");
        }
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Resolves on Ctrl-C; never resolves when the signal cannot be installed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested; draining in-flight calls");
}

// ============================================================================
// SECTION: Routing
// ============================================================================

/// Shared state for HTTP handlers.
struct ServerState {
    /// Call pipeline.
    mediator: Arc<RequestMediator>,
}

/// Builds the gateway router around `mediator`.
#[must_use]
pub fn build_router(mediator: Arc<RequestMediator>, max_body_bytes: usize) -> Router {
    let state = Arc::new(ServerState {
        mediator,
    });
    Router::new()
        .route("/tools/web.fetch", post(handle_web_fetch))
        .route("/tools/web.search", post(handle_web_search))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Handles `POST /tools/web.fetch`.
async fn handle_web_fetch(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ToolResponse {
    dispatch(&state, ToolName::WebFetch, &headers, body).await
}

/// Handles `POST /tools/web.search`.
async fn handle_web_search(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ToolResponse {
    dispatch(&state, ToolName::WebSearch, &headers, body).await
}

/// Handles `GET /health`.
async fn handle_health(State(state): State<Arc<ServerState>>) -> ToolResponse {
    state.mediator.health()
}

/// Runs one tool call on a detached task.
async fn dispatch(
    state: &ServerState,
    tool: ToolName,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ToolResponse {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let reason = rejection.body_text();
            return state.mediator.reject_body(tool, declared_length(headers), &reason);
        }
    };
    let bytes_in = bytes.len();
    let mediator = Arc::clone(&state.mediator);
    let call = tokio::spawn(async move {
        match tool {
            ToolName::WebFetch => mediator.web_fetch(&bytes).await,
            ToolName::WebSearch => mediator.web_search(&bytes).await,
        }
    });
    match call.await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(tool = tool.as_str(), error = %err, "tool call task failed");
            state.mediator.internal_error(tool, bytes_in, "tool call task failed")
        }
    }
}

/// Reads the declared request size, zero when absent.
fn declared_length(headers: &HeaderMap) -> usize {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

impl IntoResponse for ToolResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
