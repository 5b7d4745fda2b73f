// crates/tool-gateway-core/src/policy.rs
// ============================================================================
// Module: Host Allowlist Policy
// Description: Fail-closed hostname allowlist with explicit reload.
// Purpose: Decide whether an outbound hostname may be contacted.
// Dependencies: thiserror, url
// ============================================================================

//! ## Overview
//! The [`PolicyEngine`] holds an immutable [`AllowlistSnapshot`] loaded from an
//! [`AllowlistSource`] at startup. Decisions read the current snapshot; only
//! [`PolicyEngine::reload`] replaces it, and a failed reload keeps the
//! previous snapshot. Security posture: an empty allowlist denies every host,
//! and matching is exact (no suffix or subdomain matching).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Allowlist entry that admits every hostname.
pub const WILDCARD: &str = "*";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Allowlist loading errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Allowlist file exists but could not be read.
    #[error("failed to read allowlist file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Immutable set of lowercase hostnames.
///
/// # Invariants
/// - Entries are trimmed, lowercased, and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowlistSnapshot {
    /// Allowed hostnames, possibly including [`WILDCARD`].
    hosts: BTreeSet<String>,
}

impl AllowlistSnapshot {
    /// Builds a snapshot from raw entries, normalizing each one.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self {
            hosts,
        }
    }

    /// Parses a comma-separated inline allowlist.
    #[must_use]
    pub fn parse_inline(raw: &str) -> Self {
        Self::from_entries(raw.split(','))
    }

    /// Parses an allowlist file body: one host per line, `#` comments and
    /// blank lines ignored.
    #[must_use]
    pub fn parse_file(contents: &str) -> Self {
        Self::from_entries(contents.lines().map(str::trim).filter(|line| !line.starts_with('#')))
    }

    /// Returns true when `hostname` is admitted.
    #[must_use]
    pub fn allows(&self, hostname: &str) -> bool {
        if self.hosts.is_empty() {
            return false;
        }
        if self.hosts.contains(WILDCARD) {
            return true;
        }
        self.hosts.contains(&hostname.to_ascii_lowercase())
    }

    /// Returns true when no host is admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Iterates entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Where the allowlist is loaded from.
///
/// A configured file that exists wins over the inline value; the two are never
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowlistSource {
    /// Optional allowlist file path.
    pub file: Option<PathBuf>,
    /// Optional comma-separated inline allowlist.
    pub inline: Option<String>,
}

impl AllowlistSource {
    /// Loads a snapshot from the source.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Read`] when the file exists but cannot be read.
    pub fn load(&self) -> Result<AllowlistSnapshot, PolicyError> {
        if let Some(path) = self.file.as_deref()
            && path.exists()
        {
            return read_allowlist_file(path);
        }
        Ok(self.inline.as_deref().map(AllowlistSnapshot::parse_inline).unwrap_or_default())
    }
}

/// Reads and parses an allowlist file.
fn read_allowlist_file(path: &Path) -> Result<AllowlistSnapshot, PolicyError> {
    let contents = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AllowlistSnapshot::parse_file(&contents))
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Hostname policy engine.
///
/// # Invariants
/// - Readers never hold the lock beyond cloning the snapshot handle.
#[derive(Debug)]
pub struct PolicyEngine {
    /// Source used by [`PolicyEngine::reload`].
    source: AllowlistSource,
    /// Current snapshot.
    snapshot: RwLock<Arc<AllowlistSnapshot>>,
}

impl PolicyEngine {
    /// Loads the allowlist from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the source cannot be read.
    pub fn load(source: AllowlistSource) -> Result<Self, PolicyError> {
        let snapshot = source.load()?;
        Ok(Self {
            source,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Creates an engine over a fixed snapshot; reload re-reads an empty source.
    #[must_use]
    pub fn from_snapshot(snapshot: AllowlistSnapshot) -> Self {
        Self {
            source: AllowlistSource::default(),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AllowlistSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns true when `hostname` may be contacted.
    #[must_use]
    pub fn is_allowed_host(&self, hostname: &str) -> bool {
        self.snapshot().allows(hostname)
    }

    /// Re-reads the source and swaps the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the source cannot be read; the previous
    /// snapshot stays active.
    pub fn reload(&self) -> Result<Arc<AllowlistSnapshot>, PolicyError> {
        let next = Arc::new(self.source.load()?);
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&next);
        drop(guard);
        Ok(next)
    }
}

// ============================================================================
// SECTION: Hostname Extraction
// ============================================================================

/// Extracts the lowercase hostname from an absolute URL.
///
/// Returns `None` for unparseable URLs and URLs without a host. IPv6 literals
/// are returned without brackets.
#[must_use]
pub fn target_hostname(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
