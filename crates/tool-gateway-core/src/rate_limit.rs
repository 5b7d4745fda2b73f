// crates/tool-gateway-core/src/rate_limit.rs
// ============================================================================
// Module: Sliding Window Rate Limiter
// Description: Per-key admission control over a trailing 60 second window.
// Purpose: Cap tool calls per minute across all callers.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`SlidingWindowLimiter`] keeps, per key, the admission instants inside the
//! trailing [`RATE_WINDOW`]. The limit is supplied on every call so the current
//! configuration always applies.
//!
//! ## Invariants
//! - Prune, check, and record for a key happen under one lock acquisition, so
//!   concurrent admissions for the same key are totally ordered.
//! - A window never holds more than `limit` entries after an admission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the sliding window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Limiter
// ============================================================================

/// Sliding-window rate limiter keyed by string.
#[derive(Debug, Default)]
pub struct SlidingWindowLimiter {
    /// Admission instants per key, oldest first.
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Creates an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a call for `key` now when fewer than `limit` calls were admitted
    /// in the trailing window.
    #[must_use]
    pub fn allow(&self, key: &str, limit: u32) -> bool {
        self.allow_at(key, limit, Instant::now())
    }

    /// Admits a call for `key` at `now`.
    #[must_use]
    pub fn allow_at(&self, key: &str, limit: u32, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(key.to_string()).or_default();
        while window.front().is_some_and(|admitted| now.saturating_duration_since(*admitted) >= RATE_WINDOW) {
            window.pop_front();
        }
        if window.len() >= usize::try_from(limit).unwrap_or(usize::MAX) {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Returns the number of admissions currently recorded for `key`.
    #[must_use]
    pub fn in_window(&self, key: &str) -> usize {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.get(key).map_or(0, VecDeque::len)
    }
}
