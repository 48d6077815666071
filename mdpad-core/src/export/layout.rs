//! Deterministic block layout used to measure a render target before printing.
//!
//! Heights are estimated from the preview stylesheet's metrics (font size, line
//! height, paddings, margins) and the text each block carries. The model never
//! looks at fonts or the browser, so the same document always measures the same.

use super::geometry::PageGeometry;
use crate::ir::nodes::{plain_text, Block, Document, Inline, List, Table};

/// Minimum oversampling factor for the raster.
pub const MIN_SCALE: u32 = 2;

/// Measured box of one top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBox {
    pub index: usize,
    pub kind: &'static str,
    /// Height in CSS px, bottom margin included.
    pub height_px: f64,
}

/// The measured render target: block boxes plus the raster it would produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width_px: u32,
    pub height_px: u32,
    pub scale: u32,
    /// RGB fill behind the content.
    pub background: [u8; 3],
    pub blocks: Vec<BlockBox>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutModel {
    pub font_px: f64,
    pub line_height: f64,
    /// Average glyph advance as a fraction of the font size.
    pub char_width: f64,
    pub block_gap_px: f64,
    pub indent_px: f64,
}

impl Default for LayoutModel {
    fn default() -> Self {
        Self {
            font_px: 16.0,
            line_height: 1.5,
            char_width: 0.5,
            block_gap_px: 16.0,
            indent_px: 32.0,
        }
    }
}

const HEADING_SCALE: [f64; 6] = [2.0, 1.5, 1.25, 1.0, 0.875, 0.85];

impl LayoutModel {
    /// Lay out the document at the geometry's printable width and size the raster.
    pub fn rasterize(&self, doc: &Document, geometry: &PageGeometry, scale: u32) -> Raster {
        let scale = scale.max(MIN_SCALE);
        let width = geometry.printable_width_px();
        let blocks = self.layout(doc, width);
        let height: f64 = blocks.iter().map(|b| b.height_px).sum();

        Raster {
            width_px: (width * f64::from(scale)).round() as u32,
            height_px: (height * f64::from(scale)).round() as u32,
            scale,
            background: [0xff, 0xff, 0xff],
            blocks,
        }
    }

    pub fn layout(&self, doc: &Document, width_px: f64) -> Vec<BlockBox> {
        doc.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockBox {
                index,
                kind: block.kind(),
                height_px: self.block_height(block, width_px) + self.block_gap_px,
            })
            .collect()
    }

    /// Height of one block without its bottom margin.
    pub fn block_height(&self, block: &Block, width_px: f64) -> f64 {
        let line = self.font_px * self.line_height;
        match block {
            Block::Heading(heading) => {
                let level = usize::from(heading.level.clamp(1, 6));
                let font = self.font_px * HEADING_SCALE[level - 1];
                let lines = self.inline_lines(&heading.content, width_px, font);
                // h1/h2 carry a bottom rule with padding, all headings a top margin
                let rule = if level <= 2 { 0.3 * font + 1.0 } else { 0.0 };
                lines as f64 * font * 1.25 + rule + 24.0 - self.block_gap_px
            }
            Block::Paragraph(paragraph) => {
                self.inline_lines(&paragraph.content, width_px, self.font_px) as f64 * line
            }
            Block::List(list) => self.list_height(list, width_px),
            Block::BlockQuote(children) => {
                let inner = width_px - self.indent_px;
                self.stack_height(children, inner)
            }
            Block::CodeBlock(code) => {
                let lines = code.code.lines().count().max(1);
                lines as f64 * self.font_px * 0.85 * 1.45 + 32.0
            }
            Block::Table(table) => self.table_height(table, width_px),
            Block::Math(_) => 2.5 * line + 16.0,
            Block::ThematicBreak => 4.0 + 48.0 - self.block_gap_px,
            Block::Html(raw) => raw.lines().count().max(1) as f64 * line,
        }
    }

    /// Children stacked vertically with gaps between them (none after the last).
    fn stack_height(&self, blocks: &[Block], width_px: f64) -> f64 {
        let total: f64 = blocks
            .iter()
            .map(|b| self.block_height(b, width_px) + self.block_gap_px)
            .sum();
        (total - self.block_gap_px).max(0.0)
    }

    fn list_height(&self, list: &List, width_px: f64) -> f64 {
        let inner = width_px - self.indent_px;
        let item_gap = if list.tight { 4.0 } else { self.block_gap_px };
        list.items
            .iter()
            .map(|item| {
                let content = if list.tight {
                    item.blocks
                        .iter()
                        .map(|b| match b {
                            Block::Paragraph(p) => {
                                self.inline_lines(&p.content, inner, self.font_px) as f64
                                    * self.font_px
                                    * self.line_height
                            }
                            other => self.block_height(other, inner),
                        })
                        .sum()
                } else {
                    self.stack_height(&item.blocks, inner)
                };
                content.max(self.font_px * self.line_height) + item_gap
            })
            .sum()
    }

    fn table_height(&self, table: &Table, width_px: f64) -> f64 {
        let columns = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.header.len()))
            .max()
            .unwrap_or(1)
            .max(1);
        // cell padding 13px each side
        let cell_width = (width_px / columns as f64 - 26.0).max(self.font_px);
        let row_height = |cells: &[crate::ir::nodes::TableCell]| {
            let lines = cells
                .iter()
                .map(|c| self.inline_lines(&c.content, cell_width, self.font_px))
                .max()
                .unwrap_or(1);
            lines as f64 * self.font_px * self.line_height + 13.0
        };

        let header = if table.header.is_empty() {
            0.0
        } else {
            row_height(&table.header)
        };
        header + table.rows.iter().map(|r| row_height(r)).sum::<f64>()
    }

    /// Wrapped line count of a run of inlines; hard breaks start new lines.
    fn inline_lines(&self, content: &[Inline], width_px: f64, font_px: f64) -> usize {
        let per_line = ((width_px / (font_px * self.char_width)).floor() as usize).max(1);
        content
            .split(|inline| matches!(inline, Inline::LineBreak))
            .map(|segment| {
                let chars = plain_text(segment).trim().chars().count();
                chars.div_ceil(per_line).max(1)
            })
            .sum()
    }
}
