//! Artifact extraction from engineer output.
//!
//! Engineer turns mix prose and fenced code regions. This module recovers
//! the final deployable payload with an explicit, documented selection
//! rule (see [`extract_artifact`]). Extraction is pure and idempotent:
//! re-running it on the same content yields a byte-identical artifact.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during artifact extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The content contained no fenced code region to extract.
    #[error("no code artifact found in engineer output")]
    NoArtifactFound,
}

// Matches one fenced region: optional info tag, newline, body, closing fence.
static FENCED_REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_+\-]*)[ \t]*\r?\n(.*?)```").unwrap());

const MARKUP_TAGS: [&str; 4] = ["html", "htm", "xml", "svg"];

/// Extracts the single best-candidate code artifact from engineer output.
///
/// Selection rule, in order of preference:
/// 1. the last fenced region tagged as markup (`html`, `htm`, `xml`, `svg`);
/// 2. the last fenced region with any other language tag;
/// 3. the last untagged fenced region.
///
/// The most recent candidate always wins within each tier, so a revised
/// code block supersedes earlier drafts in the same turn. Content with no
/// fenced region fails with [`ExtractError::NoArtifactFound`] rather than
/// guessing at prose.
pub fn extract_artifact(content: &str) -> Result<String, ExtractError> {
    let mut last_markup = None;
    let mut last_tagged = None;
    let mut last_untagged = None;

    for capture in FENCED_REGION.captures_iter(content) {
        let tag = capture[1].to_ascii_lowercase();
        let body = capture[2].trim();
        if body.is_empty() {
            continue;
        }

        if MARKUP_TAGS.contains(&tag.as_str()) {
            last_markup = Some(body.to_string());
        } else if !tag.is_empty() {
            last_tagged = Some(body.to_string());
        } else {
            last_untagged = Some(body.to_string());
        }
    }

    last_markup
        .or(last_tagged)
        .or(last_untagged)
        .ok_or(ExtractError::NoArtifactFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_html_block() {
        let content = "Here is the app:\n```html\n<!DOCTYPE html>\n<html></html>\n```\nDone.";
        assert_eq!(
            extract_artifact(content).unwrap(),
            "<!DOCTYPE html>\n<html></html>"
        );
    }

    #[test]
    fn test_last_markup_block_wins() {
        let content = "\
First draft:\n```html\n<p>old</p>\n```\n\
Revised version:\n```html\n<p>new</p>\n```\n";
        assert_eq!(extract_artifact(content).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_markup_preferred_over_other_tags() {
        let content = "\
```html\n<div>app</div>\n```\n\
And a helper snippet:\n```js\nconsole.log('hi');\n```\n";
        assert_eq!(extract_artifact(content).unwrap(), "<div>app</div>");
    }

    #[test]
    fn test_untagged_block_is_last_resort() {
        let content = "```\nplain fenced content\n```";
        assert_eq!(extract_artifact(content).unwrap(), "plain fenced content");
    }

    #[test]
    fn test_prose_only_fails() {
        assert_eq!(
            extract_artifact("I could not produce any code this time."),
            Err(ExtractError::NoArtifactFound)
        );
    }

    #[test]
    fn test_empty_block_is_ignored() {
        let content = "```html\n\n```\nnothing in there";
        assert_eq!(extract_artifact(content), Err(ExtractError::NoArtifactFound));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let content = "```html\n<main>calculator</main>\n```";
        let first = extract_artifact(content).unwrap();
        let second = extract_artifact(content).unwrap();
        assert_eq!(first, second);
    }
}
