//! Core data structures for the rendered document tree.

/// Root of a rendered document: an ordered sequence of top-level blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    List(List),
    BlockQuote(Vec<Block>),
    CodeBlock(CodeBlock),
    Table(Table),
    Math(Math),
    ThematicBreak,
    /// Raw HTML found in the source. Rendered escaped, never interpreted.
    Html(String),
}

/// A heading with a level between 1 and 6.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub start: usize,
    /// Tight lists render item paragraphs without paragraph spacing.
    pub tight: bool,
    pub items: Vec<ListItem>,
}

/// A list item. `task` is `Some(checked)` for `- [ ]` / `- [x]` items.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub task: Option<bool>,
    pub blocks: Vec<Block>,
}

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub content: Vec<Inline>,
}

/// Column alignment hint of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

/// A LaTeX math expression. `typeset` is filled by the typesetting stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Math {
    pub source: String,
    pub display: bool,
    pub typeset: Option<Typeset>,
}

impl Math {
    pub fn new(source: impl Into<String>, display: bool) -> Self {
        Self {
            source: source.into(),
            display,
            typeset: None,
        }
    }
}

/// Outcome of typesetting one math expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Typeset {
    MathMl(String),
    Error(String),
}

/// Inline content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link {
        url: String,
        title: String,
        content: Vec<Inline>,
    },
    Image {
        src: String,
        alt: String,
        title: String,
    },
    Math(Math),
    SoftBreak,
    LineBreak,
    Html(String),
}

impl Inline {
    /// Concatenated plain text of this inline, without markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) | Inline::Html(text) => out.push_str(text),
            Inline::Strong(children)
            | Inline::Emphasis(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                content: children, ..
            } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::Math(math) => out.push_str(&math.source),
            Inline::SoftBreak | Inline::LineBreak => out.push(' '),
        }
    }
}

/// Plain text of a run of inlines.
pub fn plain_text(content: &[Inline]) -> String {
    content.iter().map(Inline::plain_text).collect()
}

impl Block {
    /// Short name of the block kind, used in logs and page plans.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading(_) => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::List(_) => "list",
            Block::BlockQuote(_) => "blockquote",
            Block::CodeBlock(_) => "code",
            Block::Table(_) => "table",
            Block::Math(_) => "math",
            Block::ThematicBreak => "rule",
            Block::Html(_) => "html",
        }
    }
}
