//! HTML parsing (HTML → IR)
//!
//! Pipeline: HTML string → RcDom (html5ever) → IR
//!
//! Used for the provisional HTML produced from `.docx` containers and for pasted
//! HTML. Only structure the IR can express survives: headings, paragraphs, lists,
//! block quotes, preformatted text, tables, rules and the common inline marks.
//! Unknown elements are unwrapped, `script`/`style`/`head` are dropped.

use crate::error::FormatError;
use crate::ir::nodes::{
    plain_text, Alignment, Block, CodeBlock, Document, Heading, Inline, List, ListItem, Paragraph,
    Table, TableCell,
};
use crate::import::markdown::serialize_to_markdown;
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, Attribute};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::RefCell;

const SKIPPED: &[&str] = &["head", "script", "style", "template", "title", "noscript"];

const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "dl", "dt", "dd", "center", "form", "fieldset", "address",
    "details", "summary", "li",
];

/// Convert HTML into canonical Markdown.
pub fn html_to_markdown(html: &str) -> Result<String, FormatError> {
    serialize_to_markdown(&html_to_document(html))
}

/// Parse HTML into the IR. html5ever recovers from any malformed input.
pub fn html_to_document(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut blocks = Vec::new();
    collect_blocks(&dom.document, &mut blocks);
    Document { blocks }
}

fn tag_of(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn attr(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => find_attr(attrs, key),
        _ => None,
    }
}

fn find_attr(attrs: &RefCell<Vec<Attribute>>, key: &str) -> Option<String> {
    attrs
        .borrow()
        .iter()
        .find(|a| &*a.name.local == key)
        .map(|a| a.value.to_string())
}

fn collect_blocks(node: &Handle, out: &mut Vec<Block>) {
    let mut pending: Vec<Inline> = Vec::new();

    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Element { name, .. } => {
                let tag = &*name.local;
                if SKIPPED.contains(&tag) {
                    continue;
                }
                if is_block(tag) {
                    flush_paragraph(&mut pending, out);
                    push_block(child, tag, out);
                } else {
                    push_inline(child, &mut pending);
                }
            }
            NodeData::Text { contents } => {
                pending.push(Inline::Text(collapse_whitespace(&contents.borrow())));
            }
            _ => {}
        }
    }

    flush_paragraph(&mut pending, out);
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "h1" | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "p"
            | "ul"
            | "ol"
            | "blockquote"
            | "pre"
            | "table"
            | "hr"
    ) || CONTAINERS.contains(&tag)
}

fn flush_paragraph(pending: &mut Vec<Inline>, out: &mut Vec<Block>) {
    let content = trim_inlines(std::mem::take(pending));
    if !content.is_empty() {
        out.push(Block::Paragraph(Paragraph { content }));
    }
}

fn push_block(node: &Handle, tag: &str, out: &mut Vec<Block>) {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse().unwrap_or(1);
            let content = trim_inlines(collect_inlines(node));
            if !content.is_empty() {
                out.push(Block::Heading(Heading { level, content }));
            }
        }
        "p" => {
            let content = trim_inlines(collect_inlines(node));
            if !content.is_empty() {
                out.push(Block::Paragraph(Paragraph { content }));
            }
        }
        "ul" | "ol" => out.push(Block::List(build_list(node, tag == "ol"))),
        "blockquote" => {
            let mut children = Vec::new();
            collect_blocks(node, &mut children);
            out.push(Block::BlockQuote(children));
        }
        "pre" => out.push(Block::CodeBlock(build_code_block(node))),
        "table" => {
            if let Some(table) = build_table(node) {
                out.push(Block::Table(table));
            }
        }
        "hr" => out.push(Block::ThematicBreak),
        _ => collect_blocks(node, out),
    }
}

fn build_list(node: &Handle, ordered: bool) -> List {
    let start = attr(node, "start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);
    let mut items: Vec<ListItem> = Vec::new();

    for child in node.children.borrow().iter() {
        match tag_of(child).as_deref() {
            Some("li") => {
                let task = task_state(child);
                let mut blocks = Vec::new();
                collect_blocks(child, &mut blocks);
                items.push(ListItem { task, blocks });
            }
            // A list nested directly in a list belongs to the previous item
            Some(tag @ ("ul" | "ol")) => {
                let nested = Block::List(build_list(child, tag == "ol"));
                match items.last_mut() {
                    Some(item) => item.blocks.push(nested),
                    None => items.push(ListItem {
                        task: None,
                        blocks: vec![nested],
                    }),
                }
            }
            _ => {}
        }
    }

    let tight = items.iter().all(|item| {
        item.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
            <= 1
    });

    List {
        ordered,
        start,
        tight,
        items,
    }
}

fn task_state(li: &Handle) -> Option<bool> {
    li.children.borrow().iter().find_map(|child| {
        let is_checkbox = tag_of(child).as_deref() == Some("input")
            && attr(child, "type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
        is_checkbox.then(|| attr(child, "checked").is_some())
    })
}

fn build_code_block(pre: &Handle) -> CodeBlock {
    let language = attr(pre, "data-language").or_else(|| {
        pre.children.borrow().iter().find_map(|child| {
            attr(child, "class").and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-").map(str::to_string))
            })
        })
    });

    CodeBlock {
        language,
        code: text_content(pre),
    }
}

fn build_table(node: &Handle) -> Option<Table> {
    let mut rows: Vec<(bool, Vec<TableCell>, Vec<Alignment>)> = Vec::new();
    collect_rows(node, false, &mut rows);
    if rows.is_empty() {
        return None;
    }

    let header_row = rows.first().is_some_and(|(header, _, _)| *header);
    let alignments = rows
        .first()
        .map(|(_, _, aligns)| aligns.clone())
        .unwrap_or_default();

    let mut cells = rows.into_iter().map(|(_, cells, _)| cells);
    let header = if header_row {
        cells.next().unwrap_or_default()
    } else {
        Vec::new()
    };

    Some(Table {
        alignments,
        header,
        rows: cells.collect(),
    })
}

fn collect_rows(
    node: &Handle,
    in_head: bool,
    rows: &mut Vec<(bool, Vec<TableCell>, Vec<Alignment>)>,
) {
    for child in node.children.borrow().iter() {
        match tag_of(child).as_deref() {
            Some("thead") => collect_rows(child, true, rows),
            Some("tbody") | Some("tfoot") => collect_rows(child, false, rows),
            Some("tr") => {
                let mut cells = Vec::new();
                let mut aligns = Vec::new();
                let mut all_th = true;
                for cell in child.children.borrow().iter() {
                    let tag = tag_of(cell);
                    if !matches!(tag.as_deref(), Some("td") | Some("th")) {
                        continue;
                    }
                    all_th &= tag.as_deref() == Some("th");
                    aligns.push(cell_alignment(cell));
                    cells.push(TableCell {
                        content: trim_inlines(collect_inlines(cell)),
                    });
                }
                if !cells.is_empty() {
                    rows.push((in_head || all_th, cells, aligns));
                }
            }
            _ => {}
        }
    }
}

fn cell_alignment(cell: &Handle) -> Alignment {
    let from_style = attr(cell, "style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim() == "text-align").then(|| value.trim().to_ascii_lowercase())
        })
    });
    let value = from_style.or_else(|| attr(cell, "align").map(|a| a.to_ascii_lowercase()));

    match value.as_deref() {
        Some("left") => Alignment::Left,
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        _ => Alignment::None,
    }
}

fn collect_inlines(node: &Handle) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in node.children.borrow().iter() {
        push_inline(child, &mut out);
    }
    out
}

fn push_inline(node: &Handle, out: &mut Vec<Inline>) {
    match &node.data {
        NodeData::Text { contents } => {
            out.push(Inline::Text(collapse_whitespace(&contents.borrow())));
        }
        NodeData::Element { name, attrs, .. } => match &*name.local {
            "strong" | "b" => push_wrapped(Inline::Strong, collect_inlines(node), out),
            "em" | "i" => push_wrapped(Inline::Emphasis, collect_inlines(node), out),
            "del" | "s" | "strike" => push_wrapped(Inline::Strikethrough, collect_inlines(node), out),
            "code" | "kbd" | "samp" | "tt" => {
                let code = text_content(node);
                if !code.is_empty() {
                    out.push(Inline::Code(code));
                }
            }
            "a" => match find_attr(attrs, "href") {
                Some(url) if !url.is_empty() => out.push(Inline::Link {
                    url,
                    title: find_attr(attrs, "title").unwrap_or_default(),
                    content: collect_inlines(node),
                }),
                _ => out.extend(collect_inlines(node)),
            },
            "img" => {
                if let Some(src) = find_attr(attrs, "src") {
                    out.push(Inline::Image {
                        src,
                        alt: find_attr(attrs, "alt").unwrap_or_default(),
                        title: find_attr(attrs, "title").unwrap_or_default(),
                    });
                }
            }
            "br" => out.push(Inline::LineBreak),
            "input" => {}
            tag if SKIPPED.contains(&tag) => {}
            _ => out.extend(collect_inlines(node)),
        },
        _ => {}
    }
}

/// Wrap `children` in a mark, unless they carry no visible text.
fn push_wrapped(wrap: fn(Vec<Inline>) -> Inline, children: Vec<Inline>, out: &mut Vec<Inline>) {
    let text = plain_text(&children);
    if text.trim().is_empty() {
        if !text.is_empty() {
            out.push(Inline::Text(" ".to_string()));
        }
        return;
    }
    let (children, leading, trailing) = split_edge_spaces(children);
    if leading {
        out.push(Inline::Text(" ".to_string()));
    }
    out.push(wrap(children));
    if trailing {
        out.push(Inline::Text(" ".to_string()));
    }
}

/// Pull whitespace at the edges of a run out of it, since `**Hi **` is not emphasis.
fn split_edge_spaces(mut children: Vec<Inline>) -> (Vec<Inline>, bool, bool) {
    let mut leading = false;
    while let Some(Inline::Text(text)) = children.first_mut() {
        let trimmed = text.trim_start();
        if trimmed.len() == text.len() {
            break;
        }
        leading = true;
        if trimmed.is_empty() {
            children.remove(0);
        } else {
            *text = trimmed.to_string();
            break;
        }
    }

    let mut trailing = false;
    while let Some(Inline::Text(text)) = children.last_mut() {
        let trimmed = text.trim_end();
        if trimmed.len() == text.len() {
            break;
        }
        trailing = true;
        if trimmed.is_empty() {
            children.pop();
        } else {
            *text = trimmed.to_string();
            break;
        }
    }

    (children, leading, trailing)
}

fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    append_text(node, &mut out);
    out
}

fn append_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { name, .. } if &*name.local == "br" => out.push('\n'),
        _ => {
            for child in node.children.borrow().iter() {
                append_text(child, out);
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Strip whitespace at the edges of a run and drop trailing line breaks.
fn trim_inlines(mut content: Vec<Inline>) -> Vec<Inline> {
    while let Some(Inline::Text(text)) = content.first_mut() {
        let trimmed = text.trim_start().to_string();
        if trimmed.is_empty() {
            content.remove(0);
        } else {
            *text = trimmed;
            break;
        }
    }

    loop {
        match content.last_mut() {
            Some(Inline::Text(text)) => {
                let trimmed = text.trim_end().to_string();
                if trimmed.is_empty() {
                    content.pop();
                } else {
                    *text = trimmed;
                    break;
                }
            }
            Some(Inline::LineBreak) | Some(Inline::SoftBreak) => {
                content.pop();
            }
            _ => break,
        }
    }

    content
}
