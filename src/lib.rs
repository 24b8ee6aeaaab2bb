mod block;
mod config;
mod excerpt;
mod highlight;
mod html;
mod inline;
mod parser;
mod sanitize;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

pub use block::{Block, List, ListItem};
pub use config::{Config, ConfigError, HighlightConfig};
pub use excerpt::markdown_to_text;
pub use highlight::{HighlightError, Highlighter, SyntectHighlighter};
pub use inline::{INLINE_PASSES, InlinePass, render_inline};
pub use sanitize::{SanitizePolicy, has_meaningful_content, sanitize};

static OPENING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)[^>]*>").expect("opening tag pattern")
});

static CLOSING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</([A-Za-z][A-Za-z0-9-]*)\s*>$").expect("closing tag pattern")
});

/// Whether a trimmed document is one HTML element: it opens and closes with
/// the same tag and has no blank line inside.
fn is_single_element(document: &str) -> bool {
    let (Some(open), Some(close)) = (OPENING_TAG.captures(document), CLOSING_TAG.captures(document))
    else {
        return false;
    };
    open[1].eq_ignore_ascii_case(&close[1]) && !document.lines().any(|line| line.trim().is_empty())
}

/// Parse markdown text into a vector of blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    parser::parse(markdown)
}

/// Convert markdown to an HTML fragment without syntax highlighting.
///
/// The output is not sanitized; see [`sanitize`].
pub fn markdown_to_html(markdown: &str) -> String {
    markdown_to_html_with(markdown, None)
}

/// Convert markdown to an HTML fragment, highlighting fenced code when a
/// highlighter is given.
///
/// A document that is a single HTML element is returned untouched.
pub fn markdown_to_html_with(markdown: &str, highlighter: Option<&dyn Highlighter>) -> String {
    let trimmed = markdown.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_single_element(trimmed) {
        debug!("document is a single html element, skipping markdown");
        return trimmed.to_string();
    }

    let blocks = parse(markdown);
    trace!(blocks = blocks.len(), "parsed markdown");
    html::blocks_to_html(&blocks, highlighter)
}

/// Render and sanitize markdown for display. This is the composition pages
/// should use; [`markdown_to_html`] alone passes raw HTML through.
///
/// Returns an empty string when nothing visible survives sanitization.
pub fn markdown_to_safe_html(
    markdown: &str,
    config: &Config,
    highlighter: Option<&dyn Highlighter>,
) -> String {
    let html = markdown_to_html_with(markdown, highlighter);
    let safe = sanitize(&html, &config.sanitize);
    if has_meaningful_content(&safe) {
        safe
    } else {
        String::new()
    }
}
