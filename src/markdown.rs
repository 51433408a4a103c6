//! Markdown to plain-text stripping.
//!
//! A pure transform at the conversion boundary: the indexing engine
//! consumes plain text units, so markdown structure and any embedded HTML
//! are removed and whitespace is flattened to single spaces.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s*").unwrap());
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*```[^\n]*$").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_]{1,3}([^*_]+)[*_]{1,3}").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Convert a markdown document into a single plain-text line.
pub fn markdown_to_text(markdown: &str) -> String {
    let text = IMAGE.replace_all(markdown, "");
    let text = LINK.replace_all(&text, "$1");
    let text = CODE_FENCE.replace_all(&text, "");
    let text = HEADING.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_headings_and_emphasis() {
        let md = "# Title\n\nSome *emphasized* and **bold** text.";
        assert_eq!(markdown_to_text(md), "Title Some emphasized and bold text.");
    }

    #[test]
    fn test_keeps_link_text_drops_target() {
        let md = "See [the guide](https://example.com/guide) for details.";
        assert_eq!(markdown_to_text(md), "See the guide for details.");
    }

    #[test]
    fn test_drops_images_and_html() {
        let md = "Before ![logo](img.png) <div class=\"x\">inside</div> after.";
        assert_eq!(markdown_to_text(md), "Before inside after.");
    }

    #[test]
    fn test_unwraps_code() {
        let md = "Run `cargo build` first.\n\n```sh\necho hi\n```\n";
        assert_eq!(markdown_to_text(md), "Run cargo build first. echo hi");
    }

    #[test]
    fn test_flattens_whitespace() {
        let md = "line one\nline two\n\n\nline three";
        assert_eq!(markdown_to_text(md), "line one line two line three");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_text(""), "");
    }
}
