//! Corruption classification from validator diagnostics.
//!
//! The rules are an explicit ordered list evaluated top to bottom; the
//! first match wins. Order is significant: a diagnostic that mentions both
//! "truncated" and "corrupt" classifies as truncated.

use crate::types::{CorruptionTag, ToolResult, VerdictStatus};

type Predicate = fn(diagnostic: &str, magic_valid: bool) -> bool;

/// Ordered classification rules over the first failing diagnostic
const RULES: [(Predicate, CorruptionTag); 4] = [
    (
        |d, _| d.contains("truncated") || d.contains("premature end"),
        CorruptionTag::Truncated,
    ),
    (
        |d, _| d.contains("cannot identify") || d.contains("cannot decode"),
        CorruptionTag::InvalidHeader,
    ),
    (|_, magic_valid| !magic_valid, CorruptionTag::InvalidHeader),
    (
        |d, _| d.contains("corrupt") || d.contains("broken"),
        CorruptionTag::CorruptSegments,
    ),
];

/// Map a failing verdict's signals to a corruption tag.
///
/// Called only for non-valid statuses. An unrecoverable status overrides
/// every text rule: nothing could read the file, so it is treated as a
/// carving false positive.
pub fn classify(status: VerdictStatus, magic_valid: bool, tool_results: &[ToolResult]) -> CorruptionTag {
    debug_assert_ne!(status, VerdictStatus::Valid);

    if status == VerdictStatus::Unrecoverable {
        return CorruptionTag::FalsePositive;
    }

    let diagnostic = tool_results
        .iter()
        .find(|r| !r.passed)
        .and_then(|r| r.diagnostic.as_deref())
        .unwrap_or("")
        .to_lowercase();

    for (predicate, tag) in RULES {
        if predicate(&diagnostic, magic_valid) {
            return tag;
        }
    }
    CorruptionTag::Unknown
}
