use std::sync::LazyLock;

use regex::{Captures, Regex};

/// One step of the inline rewrite pipeline.
pub struct InlinePass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// The inline rewrite pipeline, in application order.
///
/// Each pass replaces non-overlapping matches left to right, and the order is
/// part of the output contract:
///
/// 1. images, before links, so `![alt](src)` is not read as `!` + a link
/// 2. links
/// 3. strikethrough
/// 4. inline code; span content is escaped so later passes cannot reach it
/// 5. bare autolinks; skips tags, anchors and code emitted by earlier passes
/// 6. strong, before emphasis, so `**x**` is never split by the `*x*` rule
/// 7. emphasis
///
/// Attribute values written by these passes encode `*`, `~` and `` ` `` as
/// character references, which keeps later passes from matching inside them.
pub const INLINE_PASSES: [InlinePass; 7] = [
    InlinePass {
        name: "images",
        apply: images,
    },
    InlinePass {
        name: "links",
        apply: links,
    },
    InlinePass {
        name: "strikethrough",
        apply: strikethrough,
    },
    InlinePass {
        name: "code",
        apply: code_spans,
    },
    InlinePass {
        name: "autolinks",
        apply: autolinks,
    },
    InlinePass {
        name: "strong",
        apply: strong,
    },
    InlinePass {
        name: "emphasis",
        apply: emphasis,
    },
];

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("image pattern"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("link pattern"));

static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(.+?)~~").expect("strikethrough pattern"));

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code span pattern"));

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<]+").expect("url pattern"));

static STRONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^\s*]|[^\s*].*?[^\s*])\*\*").expect("strong pattern")
});

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^\s*](?:[^*]*?[^\s*])?)\*").expect("emphasis pattern")
});

/// Render the inline markup of a block's text to HTML.
pub fn render_inline(text: &str) -> String {
    INLINE_PASSES
        .iter()
        .fold(text.to_string(), |html, pass| (pass.apply)(&html))
}

fn images(text: &str) -> String {
    IMAGE
        .replace_all(text, |caps: &Captures| {
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_attr(&caps[2]),
                escape_attr(&caps[1])
            )
        })
        .into_owned()
}

fn links(text: &str) -> String {
    LINK.replace_all(text, |caps: &Captures| {
        format!("<a href=\"{}\">{}</a>", escape_attr(&caps[2]), &caps[1])
    })
    .into_owned()
}

fn strikethrough(text: &str) -> String {
    STRIKETHROUGH.replace_all(text, "<del>$1</del>").into_owned()
}

fn code_spans(text: &str) -> String {
    CODE_SPAN
        .replace_all(text, |caps: &Captures| {
            let mut out = String::from("<code>");
            for ch in caps[1].chars() {
                match ch {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '*' => out.push_str("&#42;"),
                    _ => out.push(ch),
                }
            }
            out.push_str("</code>");
            out
        })
        .into_owned()
}

fn strong(text: &str) -> String {
    STRONG.replace_all(text, "<strong>$1</strong>").into_owned()
}

fn emphasis(text: &str) -> String {
    EMPHASIS.replace_all(text, "<em>$1</em>").into_owned()
}

/// Wrap bare `http(s)://` URLs in anchors.
///
/// Text inside tags, and the content of `<a>`, `<code>` and `<pre>`
/// elements, is copied through untouched.
fn autolinks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut protected_depth = 0usize;
    let mut rest = text;

    while let Some(tag_start) = find_tag_start(rest) {
        let (plain, tail) = rest.split_at(tag_start);
        push_linkified(plain, protected_depth == 0, &mut out);

        let tag_len = tag_end(tail).map_or(tail.len(), |end| end + 1);
        let (tag, after) = tail.split_at(tag_len);
        if let Some((name, closing)) = tag_name(tag) {
            if matches!(name.as_str(), "a" | "code" | "pre") {
                if closing {
                    protected_depth = protected_depth.saturating_sub(1);
                } else {
                    protected_depth += 1;
                }
            }
        }
        out.push_str(tag);
        rest = after;
    }
    push_linkified(rest, protected_depth == 0, &mut out);
    out
}

/// Byte offset of the next `<` that opens a tag, comment or closing tag.
fn find_tag_start(text: &str) -> Option<usize> {
    text.match_indices('<').map(|(i, _)| i).find(|&i| {
        text[i + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
    })
}

/// Byte offset of the `>` closing the tag at the start of `tail`. A `>`
/// inside a quoted attribute value does not count.
fn tag_end(tail: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tail.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Lowercased element name of a tag, and whether it is a closing tag.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if name.is_empty() || tag.ends_with("/>") {
        return None;
    }
    Some((name, closing))
}

fn push_linkified(text: &str, linkify: bool, out: &mut String) {
    if !linkify {
        out.push_str(text);
        return;
    }
    let mut last = 0;
    for found in BARE_URL.find_iter(text) {
        let url = trim_url_end(found.as_str());
        if url.ends_with("://") {
            continue;
        }
        let end = found.start() + url.len();
        out.push_str(&text[last..found.start()]);
        out.push_str("<a href=\"");
        out.push_str(&escape_attr(url));
        out.push_str("\">");
        out.push_str(&url.replace('*', "&#42;"));
        out.push_str("</a>");
        last = end;
    }
    out.push_str(&text[last..]);
}

/// Drop trailing punctuation from a bare URL. A closing parenthesis stays
/// when it balances one opened inside the URL.
fn trim_url_end(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let Some(inner) = trimmed.strip_suffix(')') else {
            return trimmed;
        };
        if trimmed.matches('(').count() >= trimmed.matches(')').count() {
            return trimmed;
        }
        url = inner;
    }
}

/// Escape a value for use inside a double-quoted attribute.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '*' => out.push_str("&#42;"),
            '~' => out.push_str("&#126;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(ch),
        }
    }
    out
}
