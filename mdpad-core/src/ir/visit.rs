//! Tree walkers over the IR.

use super::nodes::{Block, Document, Inline, Math};

/// Call `f` on every math node of the document, block and inline, in document order.
pub fn for_each_math_mut(doc: &mut Document, f: &mut impl FnMut(&mut Math)) {
    for block in &mut doc.blocks {
        walk_block(block, f);
    }
}

fn walk_block(block: &mut Block, f: &mut impl FnMut(&mut Math)) {
    match block {
        Block::Heading(heading) => walk_inlines(&mut heading.content, f),
        Block::Paragraph(paragraph) => walk_inlines(&mut paragraph.content, f),
        Block::List(list) => {
            for item in &mut list.items {
                for child in &mut item.blocks {
                    walk_block(child, f);
                }
            }
        }
        Block::BlockQuote(children) => {
            for child in children {
                walk_block(child, f);
            }
        }
        Block::Table(table) => {
            for cell in table.header.iter_mut().chain(table.rows.iter_mut().flatten()) {
                walk_inlines(&mut cell.content, f);
            }
        }
        Block::Math(math) => f(math),
        Block::CodeBlock(_) | Block::ThematicBreak | Block::Html(_) => {}
    }
}

fn walk_inlines(inlines: &mut [Inline], f: &mut impl FnMut(&mut Math)) {
    for inline in inlines {
        match inline {
            Inline::Math(math) => f(math),
            Inline::Strong(children)
            | Inline::Emphasis(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                content: children, ..
            } => walk_inlines(children, f),
            _ => {}
        }
    }
}
