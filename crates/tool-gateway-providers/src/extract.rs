// crates/tool-gateway-providers/src/extract.rs
// ============================================================================
// Module: Plain-Text Extraction
// Description: Title and text extraction from fetched HTML.
// Purpose: Reduce a page to a bounded plain-text summary.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Extraction is deliberately shallow: no DOM is built and nothing is
//! rendered. Tags become spaces, whitespace runs collapse to one space, and
//! the result is capped at [`MAX_EXTRACTED_CHARS`] characters.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum characters kept in `extracted_text`.
pub const MAX_EXTRACTED_CHARS: usize = 12_000;

/// Compiled extraction patterns.
struct Patterns {
    /// First `<title ...>...</title>` span, case-insensitive, across lines.
    title: Regex,
    /// Any tag-like `<...>` span.
    tag: Regex,
    /// Whitespace runs.
    space: Regex,
}

/// Patterns compiled on first use; `None` only if a literal pattern is invalid.
static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(|| {
    Some(Patterns {
        title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?,
        tag: Regex::new(r"<[^>]+>").ok()?,
        space: Regex::new(r"\s+").ok()?,
    })
});

/// Returns the whitespace-collapsed page title, or `""` when absent.
#[must_use]
pub fn extract_title(html: &str) -> String {
    let Some(patterns) = PATTERNS.as_ref() else {
        return String::new();
    };
    patterns
        .title
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|inner| patterns.space.replace_all(inner.as_str(), " ").trim().to_string())
        .unwrap_or_default()
}

/// Returns tag-stripped, whitespace-collapsed text capped at
/// [`MAX_EXTRACTED_CHARS`] characters.
#[must_use]
pub fn extract_text(html: &str) -> String {
    let collapsed = match PATTERNS.as_ref() {
        Some(patterns) => {
            let without_tags = patterns.tag.replace_all(html, " ");
            patterns.space.replace_all(&without_tags, " ").trim().to_string()
        }
        None => html.split_whitespace().collect::<Vec<_>>().join(" "),
    };
    match collapsed.char_indices().nth(MAX_EXTRACTED_CHARS) {
        Some((cut, _)) => collapsed[..cut].to_string(),
        None => collapsed,
    }
}
