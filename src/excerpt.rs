use std::sync::LazyLock;

use regex::Regex;

/// Ordered (pattern, replacement) rules for turning Markdown into plain text.
/// Fenced code goes first so its content is never treated as markup, and
/// images before links so `![alt](src)` keeps only `alt`.
static PLAIN_TEXT_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?s)```.*?(?:```|\z)", ""),
        (r"(?m)^[ \t]*#{1,6}[ \t]+", ""),
        (r"\*\*(.*?)\*\*", "$1"),
        (r"\*(.*?)\*", "$1"),
        (r"`([^`]*)`", "$1"),
        (r"!\[([^\]]*)\]\([^)]*\)", "$1"),
        (r"\[([^\]]+)\]\([^)]*\)", "$1"),
        (r"(?m)^[ \t]*>[ \t]?", ""),
        (r"\n{3,}", "\n\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("plain text pattern"), replacement))
    .collect()
});

/// Strip Markdown syntax, leaving readable text for excerpts and previews.
pub fn markdown_to_text(markdown: &str) -> String {
    let text = PLAIN_TEXT_RULES
        .iter()
        .fold(markdown.replace("\r\n", "\n"), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        });
    text.trim().to_string()
}
