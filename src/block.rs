/// A single list item with at most one level of nested children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub text: String,
    /// `Some` only for task-list items; `true` when the marker was `[x]`/`[X]`
    pub checked: Option<bool>,
    /// Plain text of nested items (never task items)
    pub children: Vec<String>,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            checked: None,
            children: Vec::new(),
        }
    }
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

/// Block-level elements parsed from Markdown.
///
/// Text-bearing variants hold the raw source text; inline markup is resolved
/// when the block is written out as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    List(List),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    RawHtml {
        html: String,
    },
}
