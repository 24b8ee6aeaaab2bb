use std::sync::OnceLock;

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;
use tracing::debug;

use crate::config::HighlightConfig;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("no syntax definition for language `{0}`")]
    UnknownLanguage(String),
    #[error("unknown highlight theme `{0}`")]
    UnknownTheme(String),
    #[error("syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

/// Produces highlighted HTML for the contents of a code block.
///
/// The HTML writer falls back to plain escaped text for a block whose
/// highlighting fails.
///
/// The returned markup replaces the escaped code inside
/// `<pre><code class="language-…">`, so it must already be HTML-safe.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;
}

/// Class-based highlighter backed by syntect's bundled grammars.
///
/// Grammars are loaded on first use and shared by every later call, including
/// calls from other threads.
pub struct SyntectHighlighter {
    theme: String,
    syntaxes: OnceLock<SyntaxSet>,
}

impl SyntectHighlighter {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            syntaxes: OnceLock::new(),
        }
    }

    pub fn from_config(config: &HighlightConfig) -> Self {
        Self::new(config.theme.clone())
    }

    fn syntaxes(&self) -> &SyntaxSet {
        self.syntaxes.get_or_init(|| {
            debug!("loading syntax definitions");
            SyntaxSet::load_defaults_newlines()
        })
    }

    /// CSS rules for the configured theme, matching the emitted class names.
    pub fn stylesheet(&self) -> Result<String, HighlightError> {
        let themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .get(&self.theme)
            .ok_or_else(|| HighlightError::UnknownTheme(self.theme.clone()))?;
        Ok(css_for_theme_with_class_style(theme, ClassStyle::Spaced)?)
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::from_config(&HighlightConfig::default())
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        let syntaxes = self.syntaxes();
        let syntax = syntaxes
            .find_syntax_by_token(language)
            .ok_or_else(|| HighlightError::UnknownLanguage(language.to_string()))?;

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightError, Highlighter, SyntectHighlighter};

    #[test]
    fn known_language_gets_classes() {
        let highlighter = SyntectHighlighter::default();
        let html = highlighter.highlight("fn main() {}", "rust").unwrap();
        assert!(html.contains("<span class="));
        assert!(html.contains("main"));
        assert!(!html.contains("style="));
    }

    #[test]
    fn markup_in_code_is_escaped() {
        let highlighter = SyntectHighlighter::default();
        let html = highlighter.highlight("<script>x</script>", "html").unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn unknown_language_is_an_error() {
        let highlighter = SyntectHighlighter::default();
        assert!(matches!(
            highlighter.highlight("x", "no-such-language"),
            Err(HighlightError::UnknownLanguage(lang)) if lang == "no-such-language"
        ));
    }

    #[test]
    fn stylesheet_for_default_theme() {
        let css = SyntectHighlighter::default().stylesheet().unwrap();
        assert!(css.contains('{'));
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let highlighter = SyntectHighlighter::new("Not A Theme");
        assert!(matches!(
            highlighter.stylesheet(),
            Err(HighlightError::UnknownTheme(_))
        ));
    }

    #[test]
    fn shared_across_threads() {
        let highlighter = SyntectHighlighter::default();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert!(highlighter.highlight("let x = 1;", "rs").is_ok());
                });
            }
        });
    }
}
