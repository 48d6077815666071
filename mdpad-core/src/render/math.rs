//! Math extraction and typesetting (stage 3 of the render pipeline)
//!
//! Extraction turns ```` ```math ```` fences into display math blocks and promotes
//! paragraphs that hold nothing but one display span. Typesetting renders every
//! math node to MathML with pulldown-latex; a failure is kept on the node so the
//! serializer can mark that one expression without aborting the document.

use crate::ir::nodes::{Block, Document, Inline, Math, Typeset};
use crate::ir::visit::for_each_math_mut;
use std::panic::{self, AssertUnwindSafe};

use pulldown_latex::{
    config::DisplayMode, config::RenderConfig, mathml::push_mathml, Parser, Storage,
};

/// Rewrite math-bearing blocks into [`Block::Math`] nodes, recursively.
pub fn extract_math(doc: &mut Document) {
    extract_blocks(&mut doc.blocks);
}

fn extract_blocks(blocks: &mut [Block]) {
    for block in blocks.iter_mut() {
        if let Some(math) = promoted(block) {
            *block = Block::Math(math);
            continue;
        }

        match block {
            Block::List(list) => {
                for item in &mut list.items {
                    extract_blocks(&mut item.blocks);
                }
            }
            Block::BlockQuote(children) => extract_blocks(children),
            _ => {}
        }
    }
}

fn promoted(block: &Block) -> Option<Math> {
    match block {
        Block::CodeBlock(code) if code.language.as_deref() == Some("math") => {
            Some(Math::new(code.code.trim_end(), true))
        }
        Block::Paragraph(paragraph) => {
            let mut spans = paragraph.content.iter().filter(|inline| !is_blank(inline));
            match (spans.next(), spans.next()) {
                (Some(Inline::Math(math)), None) if math.display => Some(math.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_blank(inline: &Inline) -> bool {
    match inline {
        Inline::SoftBreak | Inline::LineBreak => true,
        Inline::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Typeset every math node of the document in place.
pub fn typeset(doc: &mut Document) {
    let mut failures = 0usize;
    for_each_math_mut(doc, &mut |math| {
        let result = typeset_expression(&math.source, math.display);
        if matches!(result, Typeset::Error(_)) {
            failures += 1;
        }
        math.typeset = Some(result);
    });

    if failures > 0 {
        tracing::debug!(failures, "math expressions failed to typeset");
    }
}

/// Typeset one LaTeX expression (without `$` delimiters) to MathML.
///
/// pulldown-latex can panic on some malformed input (a `%` inside a group, for
/// one); that is caught here and reported like any other typesetting error.
pub fn typeset_expression(latex: &str, display: bool) -> Typeset {
    match panic::catch_unwind(AssertUnwindSafe(|| typeset_unguarded(latex, display))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "typesetter panicked".to_string());
            tracing::warn!(latex, %reason, "math typesetter panicked");
            Typeset::Error(format!("could not typeset expression: {reason}"))
        }
    }
}

fn typeset_unguarded(latex: &str, display: bool) -> Typeset {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();

    if !errors.is_empty() {
        return Typeset::Error(errors.join("; "));
    }

    let mut mathml = String::new();
    match push_mathml(&mut mathml, events.into_iter(), config) {
        Ok(()) => Typeset::MathMl(mathml),
        Err(e) => Typeset::Error(e.to_string()),
    }
}
