//! Markdown serialization (IR → canonical Markdown)
//!
//! Pipeline: IR → Comrak AST → Markdown string
//!
//! Imported documents leave through this path so the editor always holds the same
//! dialect the render pipeline reads back.

use crate::error::FormatError;
use crate::ir::nodes::{
    Alignment, Block, Document, Inline, List, ListItem, Math, Table, TableCell,
};
use comrak::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeCode, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeLink, NodeList, NodeMath, NodeTable, NodeValue, TableAlignment,
};
use comrak::{format_commonmark, Arena, ComrakOptions};
use std::cell::RefCell;

/// Serialize an IR document to canonical Markdown.
pub fn serialize_to_markdown(doc: &Document) -> Result<String, FormatError> {
    // Step 1: IR → Comrak AST
    let arena = Arena::new();
    let root = new_node(&arena, NodeValue::Document);
    for block in &doc.blocks {
        append_block(&arena, root, block);
    }

    // Step 2: Comrak AST → Markdown string (using comrak's serializer)
    let mut output = Vec::new();
    format_commonmark(root, &default_comrak_options(), &mut output).map_err(|e| {
        FormatError::SerializationError(format!("Comrak serialization failed: {e}"))
    })?;

    let markdown = String::from_utf8(output)
        .map_err(|e| FormatError::SerializationError(format!("UTF-8 conversion failed: {e}")))?;

    // Remove Comrak's "end list" HTML comments which appear between consecutive lists
    Ok(markdown.replace("<!-- end list -->\n\n", ""))
}

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.math_dollars = true;
    options.render.unsafe_ = true;
    options
}

fn new_node<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> &'a AstNode<'a> {
    arena.alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))))
}

fn append_block<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, block: &Block) {
    match block {
        Block::Heading(heading) => {
            let node = new_node(
                arena,
                NodeValue::Heading(NodeHeading {
                    level: heading.level.clamp(1, 6),
                    setext: false,
                }),
            );
            parent.append(node);
            append_inlines(arena, node, &heading.content);
        }

        Block::Paragraph(paragraph) => {
            // Empty paragraphs would serialize as nothing and merge their neighbours
            if paragraph.content.is_empty() {
                return;
            }
            let node = new_node(arena, NodeValue::Paragraph);
            parent.append(node);
            append_inlines(arena, node, &paragraph.content);
        }

        Block::List(list) => append_list(arena, parent, list),

        Block::BlockQuote(children) => {
            let node = new_node(arena, NodeValue::BlockQuote);
            parent.append(node);
            for child in children {
                append_block(arena, node, child);
            }
        }

        Block::CodeBlock(code) => {
            let mut literal = code.code.clone();
            if !literal.ends_with('\n') {
                literal.push('\n');
            }
            parent.append(new_node(
                arena,
                NodeValue::CodeBlock(NodeCodeBlock {
                    fenced: true,
                    fence_char: b'`',
                    fence_length: 3,
                    fence_offset: 0,
                    info: code.language.clone().unwrap_or_default(),
                    literal,
                }),
            ));
        }

        Block::Table(table) => append_table(arena, parent, table),

        Block::Math(math) => {
            let para = new_node(arena, NodeValue::Paragraph);
            parent.append(para);
            para.append(math_node(arena, math));
        }

        Block::ThematicBreak => parent.append(new_node(arena, NodeValue::ThematicBreak)),

        Block::Html(raw) => {
            let mut literal = raw.clone();
            if !literal.ends_with('\n') {
                literal.push('\n');
            }
            parent.append(new_node(
                arena,
                NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 6,
                    literal,
                }),
            ));
        }
    }
}

fn list_attrs(list: &List) -> NodeList {
    NodeList {
        list_type: if list.ordered {
            ListType::Ordered
        } else {
            ListType::Bullet
        },
        marker_offset: 0,
        padding: 0,
        start: list.start.max(1),
        delimiter: ListDelimType::Period,
        bullet_char: b'-',
        tight: list.tight,
    }
}

fn append_list<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, list: &List) {
    let list_node = new_node(arena, NodeValue::List(list_attrs(list)));
    parent.append(list_node);

    for item in &list.items {
        append_item(arena, list_node, item, list);
    }
}

fn append_item<'a>(
    arena: &'a Arena<AstNode<'a>>,
    list_node: &'a AstNode<'a>,
    item: &ListItem,
    list: &List,
) {
    let value = match item.task {
        Some(true) => NodeValue::TaskItem(Some('x')),
        Some(false) => NodeValue::TaskItem(None),
        None => NodeValue::Item(list_attrs(list)),
    };
    let item_node = new_node(arena, value);
    list_node.append(item_node);

    for block in &item.blocks {
        append_block(arena, item_node, block);
    }
}

fn append_table<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, table: &Table) {
    // A GFM table always has a header row; promote the first body row when missing
    let mut rows: Vec<(bool, &[TableCell])> = Vec::new();
    if table.header.is_empty() {
        let mut body = table.rows.iter();
        if let Some(first) = body.next() {
            rows.push((true, first.as_slice()));
        }
        rows.extend(body.map(|row| (false, row.as_slice())));
    } else {
        rows.push((true, table.header.as_slice()));
        rows.extend(table.rows.iter().map(|row| (false, row.as_slice())));
    }

    let num_columns = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
    if num_columns == 0 {
        return;
    }

    let alignments = (0..num_columns)
        .map(|col| match table.alignments.get(col) {
            Some(Alignment::Left) => TableAlignment::Left,
            Some(Alignment::Center) => TableAlignment::Center,
            Some(Alignment::Right) => TableAlignment::Right,
            Some(Alignment::None) | None => TableAlignment::None,
        })
        .collect();

    let num_nonempty_cells = rows
        .iter()
        .flat_map(|(_, cells)| cells.iter())
        .filter(|cell| !cell.content.is_empty())
        .count();

    let table_node = new_node(
        arena,
        NodeValue::Table(NodeTable {
            alignments,
            num_columns,
            num_rows: rows.len(),
            num_nonempty_cells,
        }),
    );
    parent.append(table_node);

    for (header, cells) in rows {
        let row_node = new_node(arena, NodeValue::TableRow(header));
        table_node.append(row_node);
        for col in 0..num_columns {
            let cell_node = new_node(arena, NodeValue::TableCell);
            row_node.append(cell_node);
            if let Some(cell) = cells.get(col) {
                append_inlines(arena, cell_node, &cell.content);
            }
        }
    }
}

fn math_node<'a>(arena: &'a Arena<AstNode<'a>>, math: &Math) -> &'a AstNode<'a> {
    new_node(
        arena,
        NodeValue::Math(NodeMath {
            dollar_math: true,
            display_math: math.display,
            literal: math.source.clone(),
        }),
    )
}

fn append_inlines<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, inlines: &[Inline]) {
    for inline in inlines {
        append_inline(arena, parent, inline);
    }
}

fn append_inline<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, inline: &Inline) {
    let container = |value: NodeValue, children: &[Inline]| {
        let node = new_node(arena, value);
        parent.append(node);
        append_inlines(arena, node, children);
    };

    match inline {
        Inline::Text(text) => parent.append(new_node(arena, NodeValue::Text(text.clone()))),
        Inline::Strong(children) => container(NodeValue::Strong, children),
        Inline::Emphasis(children) => container(NodeValue::Emph, children),
        Inline::Strikethrough(children) => container(NodeValue::Strikethrough, children),
        Inline::Code(code) => parent.append(new_node(
            arena,
            NodeValue::Code(NodeCode {
                num_backticks: 1,
                literal: code.clone(),
            }),
        )),
        Inline::Link {
            url,
            title,
            content,
        } => container(
            NodeValue::Link(NodeLink {
                url: url.clone(),
                title: title.clone(),
            }),
            content,
        ),
        Inline::Image { src, alt, title } => {
            let node = new_node(
                arena,
                NodeValue::Image(NodeLink {
                    url: src.clone(),
                    title: title.clone(),
                }),
            );
            parent.append(node);
            node.append(new_node(arena, NodeValue::Text(alt.clone())));
        }
        Inline::Math(math) => parent.append(math_node(arena, math)),
        Inline::SoftBreak => parent.append(new_node(arena, NodeValue::SoftBreak)),
        Inline::LineBreak => parent.append(new_node(arena, NodeValue::LineBreak)),
        Inline::Html(raw) => parent.append(new_node(arena, NodeValue::HtmlInline(raw.clone()))),
    }
}
