// crates/tool-gateway-server/src/audit.rs
// ============================================================================
// Module: Tool Call Audit
// Description: Structured audit events and JSON-lines sinks.
// Purpose: Record exactly one event per tool call outcome.
// Dependencies: tool-gateway-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every tool call, allowed or denied, produces one [`AuditEvent`] written as a
//! single JSON line. Sinks are best-effort: [`AuditSink::record`] cannot fail,
//! a file sink falls back to stdout when a write fails, and a failed stdout
//! write drops the event. The response is computed before the event is
//! recorded and never depends on it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;
use tool_gateway_core::BackendMode;
use tool_gateway_core::ErrorCode;
use tool_gateway_core::ToolName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Reason code recorded for successful calls.
pub const REASON_OK: &str = "OK";

/// Audit decision classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDecision {
    /// The call passed policy and was dispatched.
    Allow,
    /// The call was refused before dispatch.
    Deny,
}

impl AuditDecision {
    /// Classifies an outcome by its error code.
    #[must_use]
    pub const fn for_outcome(error: Option<ErrorCode>) -> Self {
        match error {
            Some(code) if code.is_denial() => Self::Deny,
            _ => Self::Allow,
        }
    }
}

/// Tool call audit event.
///
/// # Invariants
/// - `reason_code` is [`REASON_OK`] exactly when `error_code` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// Tool invoked.
    pub tool_name: ToolName,
    /// Allow or deny.
    pub decision: AuditDecision,
    /// `OK` or the error code label.
    pub reason_code: String,
    /// Target hostname when known.
    pub domain: Option<String>,
    /// Target URL when known.
    pub url: Option<String>,
    /// HTTP status returned to the caller.
    pub http_status: u16,
    /// Wall time from validation start to response ready.
    pub duration_ms: f64,
    /// Request body size in bytes.
    pub bytes_in: usize,
    /// Response body size in bytes.
    pub bytes_out: usize,
    /// Caller-supplied agent label.
    pub requester: Option<String>,
    /// Caller-supplied request identifier.
    pub correlation_id: Option<String>,
    /// Backend mode handling the call.
    pub upstream: BackendMode,
    /// Error code on failure.
    pub error_code: Option<ErrorCode>,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records an event; must not fail or panic.
    fn record(&self, event: &AuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that writes JSON lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutAuditSink;

impl AuditSink for StdoutAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(line) = encode_line(event) {
            let _ = write_stdout(&line);
        }
    }
}

/// Audit sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// Append-only file handle.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens `path` for appending, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        let Ok(line) = encode_line(event) else {
            return;
        };
        let written = {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            file.write_all(&line).and_then(|()| file.flush())
        };
        if let Err(err) = written {
            tracing::warn!(error = %err, "audit file write failed; falling back to stdout");
            let _ = write_stdout(&line);
        }
    }
}

/// Builds the sink for an optional audit path.
///
/// A path that cannot be opened degrades to stdout with a warning.
#[must_use]
pub fn audit_sink_from_config(path: Option<&Path>) -> Arc<dyn AuditSink> {
    let Some(path) = path else {
        return Arc::new(StdoutAuditSink);
    };
    match FileAuditSink::open(path) {
        Ok(sink) => Arc::new(sink),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "audit log unavailable; writing audit events to stdout"
            );
            Arc::new(StdoutAuditSink)
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes an event as one newline-terminated line.
fn encode_line(event: &AuditEvent) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(line)
}

/// Writes a complete line to stdout in one call.
fn write_stdout(line: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(line)?;
    stdout.flush()
}
