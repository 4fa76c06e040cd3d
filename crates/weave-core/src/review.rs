//! Review verdict classification.
//!
//! The Product Owner is instructed to end every review with a literal
//! marker (`APPROVED` or `CHANGES_REQUESTED: <feedback>`). This module
//! turns that convention into a deterministic, total classification
//! function: every possible owner output maps to exactly one decision,
//! and anything without a recognized marker fails closed to
//! `RequestChanges`. That fail-closed default is the one safety property
//! keeping unreviewed code away from the publish gateway.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The outcome of classifying a Product Owner review turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// The owner approved the engineer's code.
    Approve,
    /// The owner requested changes, or emitted no recognized marker.
    RequestChanges,
}

static CHANGES_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bCHANGES_REQUESTED\b").unwrap());

static APPROVE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAPPROVED\b").unwrap());

// "NOT APPROVED" / "NOT YET APPROVED" must never count as approval.
static NEGATED_APPROVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bNOT(\s+\w+)?\s+APPROVED\b").unwrap());

/// Marker phrase used by earlier versions of the workflow; still accepted
/// as an approval token.
const LEGACY_APPROVE_MARKER: &str = "READY FOR USER APPROVAL";

/// Classifies an owner turn into an approval decision.
///
/// The function is pure and total: matching is case-insensitive,
/// `CHANGES_REQUESTED` always wins over `APPROVED`, negated approvals
/// ("NOT APPROVED") never approve, and content without any recognized
/// marker maps to [`ReviewDecision::RequestChanges`].
pub fn classify_review(content: &str) -> ReviewDecision {
    let upper = content.to_uppercase();

    if CHANGES_MARKER.is_match(&upper) {
        return ReviewDecision::RequestChanges;
    }

    if upper.contains(LEGACY_APPROVE_MARKER) {
        return ReviewDecision::Approve;
    }

    let without_negations = NEGATED_APPROVE.replace_all(&upper, "");
    if APPROVE_MARKER.is_match(&without_negations) {
        return ReviewDecision::Approve;
    }

    ReviewDecision::RequestChanges
}

/// Returns `true` if the content carries any recognized review marker.
///
/// Used by the driver to log ambiguous verdicts (which still fail closed)
/// for observability.
pub fn has_review_marker(content: &str) -> bool {
    let upper = content.to_uppercase();
    CHANGES_MARKER.is_match(&upper)
        || APPROVE_MARKER.is_match(&upper)
        || upper.contains(LEGACY_APPROVE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_approval() {
        assert_eq!(
            classify_review("Everything checks out.\n\nAPPROVED"),
            ReviewDecision::Approve
        );
    }

    #[test]
    fn test_approval_is_case_insensitive() {
        assert_eq!(classify_review("approved"), ReviewDecision::Approve);
    }

    #[test]
    fn test_changes_requested() {
        assert_eq!(
            classify_review("CHANGES_REQUESTED: add keyboard support"),
            ReviewDecision::RequestChanges
        );
    }

    #[test]
    fn test_changes_marker_wins_over_approval_marker() {
        // A verbose owner that quotes both markers must not approve.
        let content = "I would say APPROVED, but actually CHANGES_REQUESTED: fix the layout";
        assert_eq!(classify_review(content), ReviewDecision::RequestChanges);
    }

    #[test]
    fn test_negated_approval_fails_closed() {
        assert_eq!(
            classify_review("This is NOT APPROVED until the bug is fixed"),
            ReviewDecision::RequestChanges
        );
        assert_eq!(
            classify_review("NOT YET APPROVED"),
            ReviewDecision::RequestChanges
        );
    }

    #[test]
    fn test_missing_marker_fails_closed() {
        assert_eq!(
            classify_review("Looks pretty good to me, nice work!"),
            ReviewDecision::RequestChanges
        );
        assert_eq!(classify_review(""), ReviewDecision::RequestChanges);
    }

    #[test]
    fn test_legacy_marker_approves() {
        assert_eq!(
            classify_review("The solution meets all requirements.\nREADY FOR USER APPROVAL"),
            ReviewDecision::Approve
        );
    }

    #[test]
    fn test_marker_detection() {
        assert!(has_review_marker("APPROVED"));
        assert!(has_review_marker("changes_requested: nope"));
        assert!(!has_review_marker("great job team"));
    }
}
