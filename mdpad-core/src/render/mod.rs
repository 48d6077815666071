//! Render pipeline: Markdown text → visual document tree → HTML
//!
//! Stages run in a fixed order on every call:
//!
//! 1. parse:       comrak builds the block/inline AST
//! 2. extensions:  GFM tables, strikethrough, autolinks and task lists, lowered to the IR
//! 3. math:        `$…$` / `$$…$$` spans and ```` ```math ```` fences become math nodes
//! 4. render:      math is typeset to MathML, the tree is serialized to HTML
//!
//! Rendering is pure: the same text and options always produce the same result.

pub mod html;
pub mod math;
pub mod parser;

use crate::error::FormatError;
use crate::ir::nodes::Document;
use std::time::Instant;

pub(crate) const PREVIEW_CSS: &str = include_str!("../../css/preview.css");
pub(crate) const PRINT_CSS: &str = include_str!("../../css/print.css");

/// Which Markdown extensions the parser enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// GFM tables, strikethrough, autolinks and task lists
    pub gfm: bool,
    /// `$…$` / `$$…$$` LaTeX math
    pub math: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            math: true,
        }
    }
}

/// The rendered form of a document: its tree and the HTML of that tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedDocument {
    pub document: Document,
    pub html: String,
}

impl RenderedDocument {
    /// Number of top-level blocks.
    pub fn block_count(&self) -> usize {
        self.document.blocks.len()
    }
}

/// Markdown → rendered document transformer.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: RenderOptions,
}

impl Pipeline {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Run all stages over `source`.
    pub fn render(&self, source: &str) -> Result<RenderedDocument, FormatError> {
        let started = Instant::now();

        let mut document = parser::parse_markdown(source, &self.options);
        if self.options.math {
            math::extract_math(&mut document);
            math::typeset(&mut document);
        }
        let html = html::render_blocks(&document.blocks)?;

        tracing::debug!(
            blocks = document.blocks.len(),
            bytes = source.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "rendered document"
        );

        Ok(RenderedDocument { document, html })
    }
}

/// Wrap a rendered HTML body in a complete page carrying the preview stylesheet.
///
/// `extra_css` is appended after the preview rules.
pub fn standalone_html(body: &str, title: &str, extra_css: Option<&str>) -> String {
    let extra_css = extra_css.unwrap_or("");
    let escaped_title = escape_text(title);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="mdpad">
  <title>{escaped_title}</title>
  <style>
{PREVIEW_CSS}
{extra_css}
  </style>
</head>
<body>
<div class="markdown-body">
{body}
</div>
</body>
</html>"#
    )
}

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
