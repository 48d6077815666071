//! Page planning: distribute measured blocks over fixed-height pages.

use super::layout::BlockBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a tall render target is split into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pagination {
    /// Whole top-level blocks per page; a heading stays with the block after it.
    #[default]
    Structural,
    /// Fixed vertical slices of the raster; blocks may straddle a page boundary.
    Offset,
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pagination::Structural => write!(f, "structural"),
            Pagination::Offset => write!(f, "offset"),
        }
    }
}

/// One printed page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Indices of the top-level blocks (fully or partly) on this page, in order.
    pub blocks: Vec<usize>,
    /// Vertical position of the page's first pixel in the content, CSS px.
    pub offset_px: f64,
    /// Height of the content placed on the page, CSS px.
    pub height_px: f64,
    /// The page holds a single block taller than the page.
    pub oversized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub strategy: Pagination,
    pub page_height_px: f64,
    pub pages: Vec<Page>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// `structural, 2 pages: [0 1 2] [3!]` where `!` marks an oversized page.
impl fmt::Display for PagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.pages.len();
        write!(
            f,
            "{}, {} page{}:",
            self.strategy,
            count,
            if count == 1 { "" } else { "s" }
        )?;
        for page in &self.pages {
            let indices: Vec<String> = page.blocks.iter().map(usize::to_string).collect();
            write!(
                f,
                " [{}{}]",
                indices.join(" "),
                if page.oversized { "!" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Plan pages for measured blocks. An empty document still yields one page.
pub fn plan(blocks: &[BlockBox], page_height_px: f64, strategy: Pagination) -> PagePlan {
    let page_height_px = page_height_px.max(1.0);
    let pages = match strategy {
        Pagination::Structural => structural(blocks, page_height_px),
        Pagination::Offset => offset(blocks, page_height_px),
    };

    PagePlan {
        strategy,
        page_height_px,
        pages,
    }
}

fn structural(blocks: &[BlockBox], capacity: f64) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page {
        blocks: Vec::new(),
        offset_px: 0.0,
        height_px: 0.0,
        oversized: false,
    };
    let mut cursor = 0.0;

    for (i, block) in blocks.iter().enumerate() {
        if block.height_px > capacity {
            flush(&mut pages, &mut current, cursor);
            pages.push(Page {
                blocks: vec![block.index],
                offset_px: cursor,
                height_px: block.height_px,
                oversized: true,
            });
            cursor += block.height_px;
            current.offset_px = cursor;
            continue;
        }

        // Keep a heading with its follower when both fit on one page
        let needed = match blocks.get(i + 1) {
            Some(next) if block.kind == "heading" && block.height_px + next.height_px <= capacity => {
                block.height_px + next.height_px
            }
            _ => block.height_px,
        };

        if !current.blocks.is_empty() && current.height_px + needed > capacity {
            flush(&mut pages, &mut current, cursor);
        }

        current.blocks.push(block.index);
        current.height_px += block.height_px;
        cursor += block.height_px;
    }

    flush(&mut pages, &mut current, cursor);
    if pages.is_empty() {
        pages.push(Page {
            blocks: Vec::new(),
            offset_px: 0.0,
            height_px: 0.0,
            oversized: false,
        });
    }
    pages
}

fn flush(pages: &mut Vec<Page>, current: &mut Page, cursor: f64) {
    if current.blocks.is_empty() {
        return;
    }
    let next = Page {
        blocks: Vec::new(),
        offset_px: cursor,
        height_px: 0.0,
        oversized: false,
    };
    pages.push(std::mem::replace(current, next));
}

fn offset(blocks: &[BlockBox], capacity: f64) -> Vec<Page> {
    let total: f64 = blocks.iter().map(|b| b.height_px).sum();
    let count = ((total / capacity).ceil() as usize).max(1);

    (0..count)
        .map(|n| {
            let start = n as f64 * capacity;
            let end = start + capacity;
            let mut top = 0.0;
            let mut on_page = Vec::new();
            for block in blocks {
                let bottom = top + block.height_px;
                if bottom > start && top < end {
                    on_page.push(block.index);
                }
                top = bottom;
            }
            Page {
                blocks: on_page,
                offset_px: start,
                height_px: (total - start).min(capacity),
                oversized: false,
            }
        })
        .collect()
}
