use blogmark::{
    Block, Config, HighlightError, Highlighter, SanitizePolicy, markdown_to_html,
    markdown_to_html_with, markdown_to_safe_html, parse, sanitize,
};

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn blank_documents_render_nothing() {
    for input in ["", " ", "\n\n", "   \n  \n   ", "\t"] {
        assert_eq!(markdown_to_html(input), "", "{input:?}");
        assert_eq!(
            markdown_to_safe_html(input, &Config::default(), None),
            "",
            "{input:?}"
        );
    }
}

#[test]
fn heading() {
    assert_eq!(markdown_to_html("# Hello World"), "<h1>Hello World</h1>");
}

#[test]
fn three_item_list() {
    let html = markdown_to_html("- Item 1\n- Item 2\n- Item 3");
    assert_eq!(count(&html, "<ul>"), 1);
    assert_eq!(count(&html, "<li>"), 3);
    let first = html.find("Item 1").unwrap();
    let second = html.find("Item 2").unwrap();
    let third = html.find("Item 3").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn task_list_checked_state() {
    let html = markdown_to_html("- [x] Done\n- [ ] Not done");
    let items: Vec<&str> = html
        .split("<li>")
        .skip(1)
        .map(|item| item.split("</li>").next().unwrap())
        .collect();
    assert_eq!(items.len(), 2);
    assert!(items[0].contains("checked") && items[0].contains("Done"));
    assert!(!items[1].contains("checked") && items[1].contains("Not done"));
}

#[test]
fn task_list_state_survives_sanitizing() {
    let html = markdown_to_safe_html("- [x] Done\n- [ ] Not done", &Config::default(), None);
    assert_eq!(count(&html, "type=\"checkbox\""), 2);
    assert_eq!(count(&html, "checked=\"\""), 1);
    assert_eq!(count(&html, "disabled=\"\""), 2);
}

#[test]
fn fenced_code_is_verbatim() {
    assert_eq!(
        markdown_to_html("```javascript\nconst x = 42;\n```"),
        "<pre><code class=\"language-javascript\">const x = 42;</code></pre>"
    );
    let html = markdown_to_html("```javascript\nconst y = a * b * c; // _x_ [l](u) https://a.io\n```");
    assert!(html.contains("const y = a * b * c; // _x_ [l](u) https://a.io"));
    assert!(!html.contains("<em>"));
    assert!(!html.contains("<a "));
}

#[test]
fn sanitize_is_idempotent() {
    let policy = SanitizePolicy::default();
    let inputs = [
        markdown_to_html(
            "# Title\n\nSome **bold** text https://a.io\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n- [x] a\n  - b",
        ),
        "<a href=\"javascript:alert(1)\" onmouseover=\"x\">x</a><script>bad</script>".to_string(),
        "<table><tr><td>loose<td>cells</table><p>text".to_string(),
        "<img src=\"vbscript:msgbox\"><iframe src=\"https://x.io\">framed</iframe>".to_string(),
    ];
    for html in &inputs {
        let once = sanitize(html, &policy);
        assert_eq!(sanitize(&once, &policy), once, "{html}");
    }
}

#[test]
fn script_content_never_survives() {
    let policy = SanitizePolicy::default();
    for html in [
        "<script>alert(\"xss\")</script><p>Safe content</p>",
        "<p>before<script type=\"text/javascript\">steal()</script>after</p>",
        "<div><SCRIPT>shout()</SCRIPT></div>",
    ] {
        let clean = sanitize(html, &policy);
        assert!(!clean.to_ascii_lowercase().contains("<script"), "{clean}");
        assert!(!clean.contains("alert") && !clean.contains("steal") && !clean.contains("shout"));
    }
}

#[test]
fn javascript_href_is_neutralized() {
    let clean = sanitize(
        "<a href=\"javascript:alert('xss')\">Link</a>",
        &SanitizePolicy::default(),
    );
    assert_eq!(clean, "<a href=\"#\">Link</a>");

    // A markdown link gets the same treatment once sanitized
    let html = markdown_to_safe_html("[Click](javascript:alert(1))", &Config::default(), None);
    assert!(html.contains(">Click</a>"));
    assert!(!html.contains("javascript:"));
}

#[test]
fn table_structure() {
    let html = markdown_to_html("| A | B |\n|---|---|\n| 1 | 2 |");
    assert_eq!(count(&html, "<table>"), 1);
    assert_eq!(count(&html, "<tr>"), 2);
    let thead = html.find("<thead>").unwrap();
    let tbody = html.find("<tbody>").unwrap();
    assert!(thead < tbody);
    assert!(html[thead..tbody].contains("<th>A</th>") && html[thead..tbody].contains("<th>B</th>"));
    assert!(html[tbody..].contains("<td>1</td>") && html[tbody..].contains("<td>2</td>"));
}

#[test]
fn mixed_content_keeps_block_order() {
    let html = markdown_to_html("# Title\n\nSome **bold** and *italic* text.\n\n- one\n- two");
    assert_eq!(
        html,
        "<h1>Title</h1>\n<p>Some <strong>bold</strong> and <em>italic</em> text.</p>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>"
    );
}

#[test]
fn parsed_blocks_are_in_document_order() {
    let kinds: Vec<&str> = parse("# T\n\ntext\n\n```\ncode\n```\n\n| a |\n|---|\n\n<hr>\n\n1. x")
        .iter()
        .map(|block| match block {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::CodeBlock { .. } => "code",
            Block::List(_) => "list",
            Block::Table { .. } => "table",
            Block::RawHtml { .. } => "html",
        })
        .collect();
    assert_eq!(kinds, ["heading", "paragraph", "code", "table", "html", "list"]);
}

#[test]
fn complex_document() {
    let input = "# Complex Document\n\nThis is a paragraph with **bold** and *italic* text.\n\n## Code Example\n\n```javascript\nconst greeting = \"Hello, World!\";\nconsole.log(greeting);\n```\n\n## Task List\n\n- [x] Completed item\n- [ ] Pending item\n\n## Table\n\n| Column 1 | Column 2 |\n|----------|----------|\n| Value 1  | Value 2  |";
    let expected = "<h1>Complex Document</h1>\n<p>This is a paragraph with <strong>bold</strong> and <em>italic</em> text.</p>\n<h2>Code Example</h2>\n<pre><code class=\"language-javascript\">const greeting = \"Hello, World!\";\nconsole.log(greeting);</code></pre>\n<h2>Task List</h2>\n<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\"> Completed item</li>\n<li><input type=\"checkbox\" disabled=\"\"> Pending item</li>\n</ul>\n<h2>Table</h2>\n<table>\n<thead>\n<tr>\n<th>Column 1</th>\n<th>Column 2</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td>Value 1</td>\n<td>Value 2</td>\n</tr>\n</tbody>\n</table>";
    assert_eq!(markdown_to_html(input), expected);

    // Everything the renderer emits is on the default allow-list
    assert_eq!(
        markdown_to_safe_html(input, &Config::default(), None),
        sanitize(expected, &SanitizePolicy::default())
    );
}

#[test]
fn adversarial_input_does_not_blow_up() {
    let stars = "*".repeat(5_000);
    let brackets = "[".repeat(5_000) + &"](".repeat(5_000);
    let ticks = "`a".repeat(5_000);
    let urls = "https://".repeat(5_000);
    for input in [stars, brackets, ticks, urls] {
        let html = markdown_to_html(&input);
        assert!(html.starts_with("<p>") && html.ends_with("</p>"));
    }
}

struct FailingHighlighter;

impl Highlighter for FailingHighlighter {
    fn highlight(&self, _code: &str, language: &str) -> Result<String, HighlightError> {
        Err(HighlightError::UnknownLanguage(language.to_string()))
    }
}

#[test]
fn highlight_failure_keeps_the_document() {
    let html = markdown_to_html_with(
        "# Post\n\n```klingon\nqapla' <3\n```\n\nafter",
        Some(&FailingHighlighter),
    );
    assert_eq!(
        html,
        "<h1>Post</h1>\n<pre><code class=\"language-klingon\">qapla' &lt;3</code></pre>\n<p>after</p>"
    );
}

#[test]
fn concurrent_rendering() {
    let config = Config::default();
    let expected = markdown_to_safe_html("# Hi\n\n- [x] a", &config, None);
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                assert_eq!(markdown_to_safe_html("# Hi\n\n- [x] a", &config, None), expected);
            });
        }
    });
}
