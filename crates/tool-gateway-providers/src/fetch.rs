// crates/tool-gateway-providers/src/fetch.rs
// ============================================================================
// Module: Local Fetcher
// Description: Single-GET page fetcher with a deadline and byte cap.
// Purpose: Retrieve a page and reduce it to title and plain text.
// Dependencies: async-trait, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! [`HttpFetcher`] issues one GET per call, following redirects, and reads at
//! most `max_bytes` of the body; the remainder is discarded unread regardless
//! of any `Content-Length`. Non-2xx target statuses are data, not errors.
//! Security posture: the caller must have checked the target host against the
//! allowlist; the fetcher itself contacts whatever URL it is given.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;

use crate::error::UpstreamError;
use crate::extract::extract_text;
use crate::extract::extract_title;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum redirects followed by the local fetcher.
pub const MAX_REDIRECTS: usize = 10;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-call limits for a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchLimits {
    /// Deadline covering connect, headers, and body.
    pub timeout: Duration,
    /// Maximum body bytes retained.
    pub max_bytes: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

/// Result of a local fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// URL after redirects.
    pub final_url: String,
    /// Final HTTP status.
    pub status_code: u16,
    /// Extracted page title; empty when absent.
    pub title: String,
    /// Extracted plain text.
    pub extracted_text: String,
}

impl FetchResult {
    /// Builds a result from a retained body prefix.
    #[must_use]
    pub fn from_body(final_url: String, status_code: u16, body: &[u8]) -> Self {
        let html = String::from_utf8_lossy(body);
        Self {
            final_url,
            status_code,
            title: extract_title(&html),
            extracted_text: extract_text(&html),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Performs the outbound fetch for `web.fetch` in local mode.
#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// Fetches `url` within `limits`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Timeout`] when the deadline elapses and
    /// [`UpstreamError::Transport`] for connection failures.
    async fn fetch(&self, url: &str, limits: &FetchLimits) -> Result<FetchResult, UpstreamError>;
}

// ============================================================================
// SECTION: HTTP Fetcher
// ============================================================================

/// reqwest-backed [`WebFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Shared connection pool.
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a pooled client.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Transport`] when the client cannot be built.
    pub fn new() -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| UpstreamError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
        })
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, limits: &FetchLimits) -> Result<FetchResult, UpstreamError> {
        let call = async {
            let mut response = self
                .client
                .get(url)
                .header(USER_AGENT, limits.user_agent.as_str())
                .timeout(limits.timeout)
                .send()
                .await
                .map_err(|err| UpstreamError::from_reqwest(&err))?;
            let final_url = response.url().to_string();
            let status_code = response.status().as_u16();
            let body = read_body_limited(&mut response, limits.max_bytes).await?;
            tracing::debug!(
                final_url = %final_url,
                status = status_code,
                retained_bytes = body.bytes.len(),
                capped = body.capped,
                "local fetch complete"
            );
            Ok(FetchResult::from_body(final_url, status_code, &body.bytes))
        };
        tokio::time::timeout(limits.timeout, call).await.map_err(|_| UpstreamError::Timeout)?
    }
}

// ============================================================================
// SECTION: Body Reading
// ============================================================================

/// Body prefix read under a byte cap.
#[derive(Debug, Default)]
pub(crate) struct LimitedBody {
    /// Retained bytes, at most the cap.
    pub(crate) bytes: Vec<u8>,
    /// Whether reading stopped at the cap rather than at end of body.
    pub(crate) capped: bool,
}

/// Reads at most `cap` body bytes, stopping as soon as `cap` bytes are held.
pub(crate) async fn read_body_limited(
    response: &mut Response,
    cap: usize,
) -> Result<LimitedBody, UpstreamError> {
    let mut body = LimitedBody::default();
    while body.bytes.len() < cap {
        let Some(chunk) = response.chunk().await.map_err(|err| UpstreamError::from_reqwest(&err))?
        else {
            return Ok(body);
        };
        let remaining = cap - body.bytes.len();
        body.bytes.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
    }
    body.capped = true;
    Ok(body)
}
