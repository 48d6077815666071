//! Markdown parsing (stages 1 and 2 of the render pipeline)
//!
//! Pipeline: Markdown string → Comrak AST (GFM + math extensions) → IR

use super::RenderOptions;
use crate::ir::nodes::{
    plain_text, Alignment, Block, CodeBlock, Document, Heading, Inline, List, ListItem, Math,
    Paragraph, Table, TableCell,
};
use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{parse_document, Arena, ComrakOptions};

/// Parse Markdown text into the IR.
///
/// Comrak never fails on input: anything it cannot interpret ends up as text.
pub fn parse_markdown(source: &str, options: &RenderOptions) -> Document {
    // Step 1: Markdown string → Comrak AST, with the GFM extensions applied
    let arena = Arena::new();
    let root = parse_document(&arena, source, &comrak_options(options));

    // Step 2: Comrak AST → IR
    Document {
        blocks: lower_blocks(root),
    }
}

pub(crate) fn comrak_options(options: &RenderOptions) -> ComrakOptions<'static> {
    let mut comrak = ComrakOptions::default();
    comrak.extension.table = options.gfm;
    comrak.extension.strikethrough = options.gfm;
    comrak.extension.autolink = options.gfm;
    comrak.extension.tasklist = options.gfm;
    comrak.extension.math_dollars = options.math;
    comrak.extension.math_code = options.math;
    comrak
}

fn lower_blocks<'a>(parent: &'a AstNode<'a>) -> Vec<Block> {
    parent.children().filter_map(lower_block).collect()
}

fn lower_block<'a>(node: &'a AstNode<'a>) -> Option<Block> {
    let block = match &node.data.borrow().value {
        NodeValue::Heading(heading) => Block::Heading(Heading {
            level: heading.level.clamp(1, 6),
            content: lower_inlines(node),
        }),

        NodeValue::Paragraph => Block::Paragraph(Paragraph {
            content: lower_inlines(node),
        }),

        NodeValue::List(list) => Block::List(List {
            ordered: matches!(list.list_type, ListType::Ordered),
            start: list.start,
            tight: list.tight,
            items: node.children().map(lower_item).collect(),
        }),

        NodeValue::BlockQuote => Block::BlockQuote(lower_blocks(node)),

        NodeValue::CodeBlock(code) => {
            let language = code
                .info
                .split_whitespace()
                .next()
                .map(|lang| lang.to_string());
            Block::CodeBlock(CodeBlock {
                language,
                code: code.literal.clone(),
            })
        }

        NodeValue::HtmlBlock(html) => Block::Html(html.literal.clone()),

        NodeValue::ThematicBreak => Block::ThematicBreak,

        NodeValue::Table(table) => lower_table(node, &table.alignments),

        // Front matter, footnote definitions and other extensions we do not enable
        _ => return None,
    };

    Some(block)
}

fn lower_item<'a>(node: &'a AstNode<'a>) -> ListItem {
    let task = match &node.data.borrow().value {
        NodeValue::TaskItem(symbol) => Some(symbol.is_some()),
        _ => None,
    };

    ListItem {
        task,
        blocks: lower_blocks(node),
    }
}

fn lower_table<'a>(node: &'a AstNode<'a>, alignments: &[TableAlignment]) -> Block {
    let mut header = Vec::new();
    let mut rows = Vec::new();

    for row in node.children() {
        let is_header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
        let cells: Vec<TableCell> = row
            .children()
            .map(|cell| TableCell {
                content: lower_inlines(cell),
            })
            .collect();

        if is_header {
            header = cells;
        } else {
            rows.push(cells);
        }
    }

    Block::Table(Table {
        alignments: alignments
            .iter()
            .map(|align| match align {
                TableAlignment::Left => Alignment::Left,
                TableAlignment::Center => Alignment::Center,
                TableAlignment::Right => Alignment::Right,
                TableAlignment::None => Alignment::None,
            })
            .collect(),
        header,
        rows,
    })
}

fn lower_inlines<'a>(parent: &'a AstNode<'a>) -> Vec<Inline> {
    parent.children().filter_map(lower_inline).collect()
}

fn lower_inline<'a>(node: &'a AstNode<'a>) -> Option<Inline> {
    let inline = match &node.data.borrow().value {
        NodeValue::Text(text) => Inline::Text(text.clone()),
        NodeValue::Strong => Inline::Strong(lower_inlines(node)),
        NodeValue::Emph => Inline::Emphasis(lower_inlines(node)),
        NodeValue::Strikethrough => Inline::Strikethrough(lower_inlines(node)),
        NodeValue::Code(code) => Inline::Code(code.literal.clone()),
        NodeValue::Link(link) => Inline::Link {
            url: link.url.clone(),
            title: link.title.clone(),
            content: lower_inlines(node),
        },
        NodeValue::Image(link) => Inline::Image {
            src: link.url.clone(),
            alt: plain_text(&lower_inlines(node)),
            title: link.title.clone(),
        },
        NodeValue::Math(math) => Inline::Math(Math::new(math.literal.clone(), math.display_math)),
        NodeValue::SoftBreak => Inline::SoftBreak,
        NodeValue::LineBreak => Inline::LineBreak,
        NodeValue::HtmlInline(html) => Inline::Html(html.clone()),
        _ => return None,
    };

    Some(inline)
}
