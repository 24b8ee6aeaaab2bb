use tracing::debug;

use crate::block::{Block, List};
use crate::highlight::Highlighter;
use crate::inline::{escape_attr, render_inline};

/// Convert blocks to an HTML fragment, one block per line.
///
/// Blocks that produce no markup are left out entirely.
pub fn blocks_to_html(blocks: &[Block], highlighter: Option<&dyn Highlighter>) -> String {
    let mut out = String::new();
    let mut html = String::new();

    for block in blocks {
        html.clear();
        emit_block(block, highlighter, &mut html);
        if html.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&html);
    }

    out
}

fn emit_block(block: &Block, highlighter: Option<&dyn Highlighter>, out: &mut String) {
    match block {
        Block::Heading { level, text } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<h{level}>"));
            out.push_str(&render_inline(text));
            out.push_str(&format!("</h{level}>"));
        }
        Block::Paragraph { text } => {
            if text.trim().is_empty() {
                return;
            }
            out.push_str("<p>");
            out.push_str(&render_inline(text));
            out.push_str("</p>");
        }
        Block::CodeBlock { language, content } => {
            emit_code_block(language.as_deref(), content, highlighter, out);
        }
        Block::List(list) => list_to_html(list, out),
        Block::Table { headers, rows } => table_to_html(headers, rows, out),
        Block::RawHtml { html } => out.push_str(html),
    }
}

fn emit_code_block(
    language: Option<&str>,
    content: &str,
    highlighter: Option<&dyn Highlighter>,
    out: &mut String,
) {
    let Some(lang) = language else {
        out.push_str("<pre><code>");
        escape_html(content, out);
        out.push_str("</code></pre>");
        return;
    };

    out.push_str("<pre><code class=\"language-");
    out.push_str(&escape_attr(lang));
    out.push_str("\">");
    match highlighter.map(|h| h.highlight(content, lang)) {
        Some(Ok(highlighted)) => out.push_str(&highlighted),
        Some(Err(e)) => {
            debug!(language = lang, error = %e, "rendering code block without highlighting");
            escape_html(content, out);
        }
        None => escape_html(content, out),
    }
    out.push_str("</code></pre>");
}

fn list_to_html(list: &List, out: &mut String) {
    let tag = if list.ordered { "ol" } else { "ul" };
    out.push_str(&format!("<{tag}>\n"));

    for item in &list.items {
        out.push_str("<li>");
        if let Some(checked) = item.checked {
            out.push_str(if checked {
                "<input type=\"checkbox\" checked=\"\" disabled=\"\">"
            } else {
                "<input type=\"checkbox\" disabled=\"\">"
            });
            if !item.text.is_empty() {
                out.push(' ');
            }
        }
        out.push_str(&render_inline(&item.text));

        if !item.children.is_empty() {
            out.push_str("\n<ul>\n");
            for child in &item.children {
                out.push_str("<li>");
                out.push_str(&render_inline(child));
                out.push_str("</li>\n");
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</li>\n");
    }

    out.push_str(&format!("</{tag}>"));
}

fn table_to_html(headers: &[String], rows: &[Vec<String>], out: &mut String) {
    out.push_str("<table>\n<thead>\n<tr>\n");
    for cell in headers {
        out.push_str("<th>");
        out.push_str(&render_inline(cell));
        out.push_str("</th>\n");
    }
    out.push_str("</tr>\n</thead>\n");

    if !rows.is_empty() {
        out.push_str("<tbody>\n");
        for row in rows {
            out.push_str("<tr>\n");
            for cell in row {
                out.push_str("<td>");
                out.push_str(&render_inline(cell));
                out.push_str("</td>\n");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }

    out.push_str("</table>");
}

/// Escape text for an element body. Quotes are left as-is.
fn escape_html(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
