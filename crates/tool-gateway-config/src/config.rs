// crates/tool-gateway-config/src/config.rs
// ============================================================================
// Module: Gateway Configuration
// Description: Environment-driven configuration loading and validation.
// Purpose: Provide fail-closed settings for policy, limits, and backends.
// Dependencies: tool-gateway-core, thiserror, url
// ============================================================================

//! ## Overview
//! [`GatewayConfig::from_env`] reads every setting from the environment.
//! Blank values count as unset. Malformed numbers, unknown backend modes, and
//! unusable webhook URLs are rejected at startup rather than defaulted.
//! Security posture: the shared secret never appears in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tool_gateway_core::AllowlistSource;
use tool_gateway_core::BackendMode;
use tool_gateway_core::ToolName;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Backend selection variable.
pub const ENV_TOOL_BACKEND: &str = "TOOL_BACKEND";
/// Inline comma-separated allowlist variable.
pub const ENV_WEB_ALLOWLIST: &str = "WEB_ALLOWLIST";
/// Allowlist file path variable.
pub const ENV_WEB_ALLOWLIST_FILE: &str = "WEB_ALLOWLIST_FILE";
/// Outbound deadline variable.
pub const ENV_WEB_TIMEOUT_MS: &str = "WEB_TIMEOUT_MS";
/// Outbound byte cap variable.
pub const ENV_WEB_MAX_BYTES: &str = "WEB_MAX_BYTES";
/// n8n fetch webhook variable.
pub const ENV_N8N_WEB_FETCH_URL: &str = "N8N_WEB_FETCH_URL";
/// n8n search webhook variable.
pub const ENV_N8N_WEB_SEARCH_URL: &str = "N8N_WEB_SEARCH_URL";
/// Webhook shared secret variable.
pub const ENV_TOOL_SHARED_SECRET: &str = "TOOL_SHARED_SECRET";
/// Per-tool rate limit variable.
pub const ENV_TOOL_RATE_LIMIT_PER_MINUTE: &str = "TOOL_RATE_LIMIT_PER_MINUTE";
/// Audit log file variable.
pub const ENV_AUDIT_LOG_PATH: &str = "AUDIT_LOG_PATH";
/// Listen address variable.
pub const ENV_TOOL_GATEWAY_BIND: &str = "TOOL_GATEWAY_BIND";
/// Request body cap variable.
pub const ENV_TOOL_GATEWAY_MAX_BODY_BYTES: &str = "TOOL_GATEWAY_MAX_BODY_BYTES";
/// Outbound User-Agent variable.
pub const ENV_TOOL_GATEWAY_USER_AGENT: &str = "TOOL_GATEWAY_USER_AGENT";

/// Default outbound deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;
/// Default outbound byte cap.
pub const DEFAULT_MAX_BYTES: usize = 1_500_000;
/// Default per-tool calls per minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 120;
/// Default listen port on loopback.
pub const DEFAULT_PORT: u16 = 8080;
/// Default request body cap.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default outbound User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!("tool-gateway/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but cannot be parsed.
    #[error("invalid {name}: {message}")]
    Parse {
        /// Variable name.
        name: &'static str,
        /// Failure description.
        message: String,
    },
    /// Parsed configuration violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared secret sent to webhooks as `X-Tool-Secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret for header construction.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Gateway configuration.
///
/// # Invariants
/// - After [`GatewayConfig::validate`], timeouts and byte caps are non-zero and
///   webhook URLs are absolute http(s) URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Backend executing tool calls.
    pub backend: BackendMode,
    /// Allowlist source for the policy engine.
    pub allowlist: AllowlistSource,
    /// Outbound deadline in milliseconds.
    pub timeout_ms: u64,
    /// Outbound byte cap for fetched bodies and webhook replies.
    pub max_bytes: usize,
    /// n8n webhook for `web.fetch`.
    pub n8n_web_fetch_url: Option<String>,
    /// n8n webhook for `web.search`.
    pub n8n_web_search_url: Option<String>,
    /// Optional webhook shared secret.
    pub shared_secret: Option<SharedSecret>,
    /// Per-tool calls admitted per minute; at least 1.
    pub rate_limit_per_minute: u32,
    /// Audit log file; stdout when absent.
    pub audit_log_path: Option<PathBuf>,
    /// HTTP listen address.
    pub bind: SocketAddr,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
    /// User-Agent for local fetches.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: BackendMode::Local,
            allowlist: AllowlistSource::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_bytes: DEFAULT_MAX_BYTES,
            n8n_web_fetch_url: None,
            n8n_web_search_url: None,
            shared_secret: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            audit_log_path: None,
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        };
        let backend = match get(ENV_TOOL_BACKEND) {
            Some(raw) => BackendMode::from_str(&raw).map_err(|err| ConfigError::Parse {
                name: ENV_TOOL_BACKEND,
                message: err.to_string(),
            })?,
            None => BackendMode::Local,
        };
        let rate_limit = parse_or(
            get(ENV_TOOL_RATE_LIMIT_PER_MINUTE),
            ENV_TOOL_RATE_LIMIT_PER_MINUTE,
            i64::from(DEFAULT_RATE_LIMIT_PER_MINUTE),
        )?;
        let bind = parse_or(get(ENV_TOOL_GATEWAY_BIND), ENV_TOOL_GATEWAY_BIND, Self::default().bind)?;
        let config = Self {
            backend,
            allowlist: AllowlistSource {
                file: get(ENV_WEB_ALLOWLIST_FILE).map(PathBuf::from),
                inline: get(ENV_WEB_ALLOWLIST),
            },
            timeout_ms: parse_or(get(ENV_WEB_TIMEOUT_MS), ENV_WEB_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?,
            max_bytes: parse_or(get(ENV_WEB_MAX_BYTES), ENV_WEB_MAX_BYTES, DEFAULT_MAX_BYTES)?,
            n8n_web_fetch_url: get(ENV_N8N_WEB_FETCH_URL),
            n8n_web_search_url: get(ENV_N8N_WEB_SEARCH_URL),
            shared_secret: get(ENV_TOOL_SHARED_SECRET).map(SharedSecret::new),
            rate_limit_per_minute: clamp_rate_limit(rate_limit),
            audit_log_path: get(ENV_AUDIT_LOG_PATH).map(PathBuf::from),
            bind,
            max_body_bytes: parse_or(
                get(ENV_TOOL_GATEWAY_MAX_BODY_BYTES),
                ENV_TOOL_GATEWAY_MAX_BODY_BYTES,
                DEFAULT_MAX_BODY_BYTES,
            )?,
            user_agent: get(ENV_TOOL_GATEWAY_USER_AGENT)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a constraint is violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(format!("{ENV_WEB_TIMEOUT_MS} must be greater than zero")));
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid(format!("{ENV_WEB_MAX_BYTES} must be greater than zero")));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(format!(
                "{ENV_TOOL_GATEWAY_MAX_BODY_BYTES} must be greater than zero"
            )));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid(format!(
                "{ENV_TOOL_RATE_LIMIT_PER_MINUTE} must be at least 1"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{ENV_TOOL_GATEWAY_USER_AGENT} must not be blank")));
        }
        validate_webhook(ENV_N8N_WEB_FETCH_URL, self.n8n_web_fetch_url.as_deref())?;
        validate_webhook(ENV_N8N_WEB_SEARCH_URL, self.n8n_web_search_url.as_deref())?;
        Ok(())
    }

    /// Returns the outbound deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the configured webhook for `tool`.
    #[must_use]
    pub fn webhook_url(&self, tool: ToolName) -> Option<&str> {
        match tool {
            ToolName::WebFetch => self.n8n_web_fetch_url.as_deref(),
            ToolName::WebSearch => self.n8n_web_search_url.as_deref(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an optional value or returns `default`.
fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |value| {
        value.parse::<T>().map_err(|err| ConfigError::Parse {
            name,
            message: format!("'{value}': {err}"),
        })
    })
}

/// Floors the rate limit at 1 and saturates at `u32::MAX`.
fn clamp_rate_limit(raw: i64) -> u32 {
    u32::try_from(raw.max(1)).unwrap_or(u32::MAX)
}

/// Checks that a configured webhook is an absolute http(s) URL.
fn validate_webhook(name: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    let Some(raw) = value else {
        return Ok(());
    };
    let url = Url::parse(raw).map_err(|err| ConfigError::Invalid(format!("{name}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{name} must be an absolute http(s) url")));
    }
    Ok(())
}
