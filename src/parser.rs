use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, List, ListItem};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading pattern"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|(\d+)\.)[ \t]+(.*)$").expect("list marker pattern"));

static TASK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([ xX])\](?:[ \t]+(.*))?$").expect("task marker pattern"));

static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?$").expect("table separator pattern")
});

/// Parse markdown text into a list of blocks
pub fn parse(markdown: &str) -> Vec<Block> {
    BlockParser::new(markdown).collect()
}

/// Line cursor over the source. Each call to `next` consumes the lines of
/// exactly one block, so block spans never overlap.
struct BlockParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

struct ListMarker<'a> {
    ordered: bool,
    text: &'a str,
}

impl<'a> BlockParser<'a> {
    fn new(markdown: &'a str) -> Self {
        Self {
            lines: markdown.lines().collect(),
            pos: 0,
        }
    }

    fn line(&self, pos: usize) -> Option<&'a str> {
        self.lines.get(pos).copied()
    }

    fn skip_blank_lines(&mut self) {
        while self.line(self.pos).is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    fn table_starts_at(&self, pos: usize) -> bool {
        let Some(header) = self.line(pos) else {
            return false;
        };
        header.contains('|') && self.line(pos + 1).is_some_and(is_table_separator)
    }

    /// Whether the line at `pos` would open a block other than a paragraph.
    fn block_starts_at(&self, pos: usize) -> bool {
        let Some(line) = self.line(pos) else {
            return false;
        };
        fence_language(line).is_some()
            || self.table_starts_at(pos)
            || list_marker(line).is_some()
            || HEADING.is_match(line.trim())
            || is_html_line(line)
    }

    fn code_block(&mut self, language: Option<String>) -> Block {
        self.pos += 1;
        let mut lines = Vec::new();
        // An unclosed fence runs to the end of input
        while let Some(line) = self.line(self.pos) {
            self.pos += 1;
            if line.trim_start().starts_with("```") {
                break;
            }
            lines.push(line);
        }
        Block::CodeBlock {
            language,
            content: lines.join("\n"),
        }
    }

    fn table(&mut self) -> Block {
        let headers = split_row(self.lines[self.pos]);
        // Header row plus the separator row, which carries no content
        self.pos += 2;

        let mut rows = Vec::new();
        while let Some(line) = self.line(self.pos) {
            if is_blank(line) || !line.contains('|') {
                break;
            }
            rows.push(split_row(line));
            self.pos += 1;
        }
        Block::Table { headers, rows }
    }

    fn list(&mut self, first: ListMarker<'a>) -> Block {
        let ordered = first.ordered;
        let mut items = vec![list_item(first.text)];
        self.pos += 1;

        while let Some(line) = self.line(self.pos) {
            if is_blank(line) {
                break;
            }
            let indent = indent_width(line);
            let marker = list_marker(line);
            let Some(last) = items.last_mut() else {
                break;
            };

            match (indent, marker) {
                (0 | 1, Some(marker)) if marker.ordered == ordered => {
                    items.push(list_item(marker.text));
                }
                (0 | 1, _) => break,
                (2, Some(marker)) => last.children.push(marker.text.trim().to_string()),
                _ => {
                    // Anything indented further continues the latest item
                    let target = last.children.last_mut().unwrap_or(&mut last.text);
                    append_text(target, line.trim());
                }
            }
            self.pos += 1;
        }

        Block::List(List { ordered, items })
    }

    fn raw_html(&mut self) -> Block {
        let start = self.pos;
        while self
            .line(self.pos)
            .is_some_and(|line| !is_blank(line) && is_html_line(line))
        {
            self.pos += 1;
        }
        Block::RawHtml {
            html: self.lines[start..self.pos].join("\n"),
        }
    }

    fn paragraph(&mut self) -> Block {
        let mut parts: Vec<&str> = Vec::new();
        while let Some(line) = self.line(self.pos) {
            if is_blank(line) || (!parts.is_empty() && self.block_starts_at(self.pos)) {
                break;
            }
            parts.push(line.trim());
            self.pos += 1;
        }
        Block::Paragraph {
            text: parts.join(" "),
        }
    }
}

impl Iterator for BlockParser<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        self.skip_blank_lines();
        let line = self.line(self.pos)?;

        if let Some(language) = fence_language(line) {
            return Some(self.code_block(language));
        }
        if self.table_starts_at(self.pos) {
            return Some(self.table());
        }
        if let Some(marker) = list_marker(line) {
            return Some(self.list(marker));
        }
        if let Some(caps) = HEADING.captures(line.trim()) {
            self.pos += 1;
            return Some(Block::Heading {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
            });
        }
        if is_html_line(line) {
            return Some(self.raw_html());
        }
        Some(self.paragraph())
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_html_line(line: &str) -> bool {
    line.trim_start().starts_with('<')
}

fn is_table_separator(line: &str) -> bool {
    let line = line.trim();
    line.contains('|') && TABLE_SEPARATOR.is_match(line)
}

/// Returns `Some(language)` when the line opens a fenced code block.
fn fence_language(line: &str) -> Option<Option<String>> {
    let info = line.trim_start().strip_prefix("```")?;
    Some(
        info.split_whitespace()
            .next()
            .filter(|token| !token.contains('`'))
            .map(str::to_string),
    )
}

fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    let caps = LIST_MARKER.captures(line.trim_start())?;
    Some(ListMarker {
        ordered: caps.get(1).is_some(),
        text: caps.get(2).map_or("", |m| m.as_str()),
    })
}

fn list_item(text: &str) -> ListItem {
    match TASK_MARKER.captures(text) {
        Some(caps) => ListItem {
            text: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            checked: Some(&caps[1] != " "),
            children: Vec::new(),
        },
        None => ListItem::new(text.trim()),
    }
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn append_text(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

fn split_row(line: &str) -> Vec<String> {
    let row = line.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(|cell| cell.trim().to_string()).collect()
}
