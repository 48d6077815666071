//! Document exporter: rendered document → paginated A4 PDF
//!
//! An export runs four steps on the visible render target:
//!
//! 1. measure:    the [`layout::LayoutModel`] lays the blocks out at the printable
//!    width and sizes an oversampled raster on a white background
//! 2. geometry:   A4 portrait with uniform margins ([`geometry::PageGeometry`])
//! 3. paginate:   blocks are packed into pages ([`paginate::plan`]) and each page
//!    becomes a `<section class="page">` of the print HTML
//! 4. serialize:  a [`backend::PdfBackend`] prints the HTML, the bytes go to an
//!    [`ArtifactSink`] under the fixed name `documento.pdf`
//!
//! Only one export runs at a time. A request that arrives while one is running is
//! ignored, and the busy flag is released on every exit path.

pub mod backend;
pub mod geometry;
pub mod layout;
pub mod paginate;

use crate::error::ExportError;
use crate::render::{html::render_blocks, standalone_html, RenderedDocument, PRINT_CSS};
use backend::{PdfBackend, PrintJob};
use geometry::PageGeometry;
use layout::{LayoutModel, Raster};
use paginate::{PagePlan, Pagination};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

pub const PDF_FILENAME: &str = "documento.pdf";
pub const HTML_FILENAME: &str = "documento.html";
pub const MARKDOWN_FILENAME: &str = "documento.md";

/// Which view is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Preview,
    Fullscreen,
}

/// The rendered document as shown in one view.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub kind: TargetKind,
    pub document: RenderedDocument,
}

impl RenderTarget {
    pub fn new(kind: TargetKind, document: RenderedDocument) -> Self {
        Self { kind, document }
    }
}

/// A file written by an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub path: PathBuf,
    /// Pages in the page plan the print HTML was built from. The backend is not
    /// asked how many pages it actually produced.
    pub planned_pages: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Saved(ExportArtifact),
    /// Another export was already running; nothing was done.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub margin_mm: f64,
    /// Raster oversampling factor; values below 2 are raised to 2.
    pub scale: u32,
    pub pagination: Pagination,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            margin_mm: geometry::DEFAULT_MARGIN_MM,
            scale: layout::MIN_SCALE,
            pagination: Pagination::Structural,
        }
    }
}

impl ExportSettings {
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::a4(self.margin_mm)
    }
}

/// Where finished files go.
pub trait ArtifactSink: Send + Sync {
    /// Store `bytes` under `filename`, replacing any previous file, and return its location.
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Saves into a directory. Files appear atomically: a failed write leaves nothing behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}

/// Everything computed before the backend runs.
#[derive(Debug, Clone)]
pub struct PrintPlan {
    pub raster: Raster,
    /// Raster size once scaled to the printable width, in mm.
    pub placed_mm: (f64, f64),
    pub pages: PagePlan,
    pub html: String,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Exporter {
    backend: Arc<dyn PdfBackend>,
    sink: Arc<dyn ArtifactSink>,
    settings: ExportSettings,
    layout: LayoutModel,
    busy: AtomicBool,
}

impl Exporter {
    pub fn new(
        backend: Arc<dyn PdfBackend>,
        sink: Arc<dyn ArtifactSink>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            backend,
            sink,
            settings,
            layout: LayoutModel::default(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// True while an export is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Measure, paginate and build the print HTML for a rendered document.
    pub fn prepare(&self, rendered: &RenderedDocument) -> Result<PrintPlan, ExportError> {
        let geometry = self.settings.geometry();
        let raster = self
            .layout
            .rasterize(&rendered.document, &geometry, self.settings.scale);
        let placed_mm = geometry.fit_to_width(raster.width_px, raster.height_px);
        let pages = paginate::plan(
            &raster.blocks,
            geometry.printable_height_px(),
            self.settings.pagination,
        );
        tracing::debug!(
            raster_width = raster.width_px,
            raster_height = raster.height_px,
            placed_height_mm = placed_mm.1,
            plan = %pages,
            "planned export"
        );

        let html = self.print_html(rendered, &pages)?;
        Ok(PrintPlan {
            raster,
            placed_mm,
            pages,
            html,
        })
    }

    fn print_html(&self, rendered: &RenderedDocument, plan: &PagePlan) -> Result<String, ExportError> {
        let blocks = &rendered.document.blocks;
        let mut body = String::new();

        match plan.strategy {
            Pagination::Structural => {
                for page in &plan.pages {
                    body.push_str("<section class=\"page\">\n");
                    // Structural pages hold contiguous runs of blocks
                    if let (Some(&first), Some(&last)) = (page.blocks.first(), page.blocks.last()) {
                        if let Some(run) = blocks.get(first..=last) {
                            body.push_str(&render_blocks(run)?);
                        }
                    }
                    body.push_str("</section>\n");
                }
            }
            // Slices are cut by the printer as the content flows
            Pagination::Offset => {
                body.push_str("<section class=\"page\">\n");
                body.push_str(&rendered.html);
                body.push_str("</section>\n");
            }
        }

        let css = format!("{PRINT_CSS}\n{}\n", self.settings.geometry().page_rule());
        Ok(standalone_html(&body, "documento", Some(&css)))
    }

    /// Export the target to `documento.pdf`.
    pub async fn export(&self, target: RenderTarget) -> Result<ExportOutcome, ExportError> {
        self.export_with_cancel(target, CancellationToken::new())
            .await
    }

    /// Export, giving up with [`ExportError::Cancelled`] if `cancel` fires before the
    /// file is written.
    pub async fn export_with_cancel(
        &self,
        target: RenderTarget,
        cancel: CancellationToken,
    ) -> Result<ExportOutcome, ExportError> {
        let Some(_guard) = self.try_acquire() else {
            tracing::warn!(target_kind = ?target.kind, "export already in progress, request ignored");
            return Ok(ExportOutcome::Ignored);
        };

        let plan = self.prepare(&target.document)?;
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let backend = Arc::clone(&self.backend);
        let geometry = self.settings.geometry();
        let scale = plan.raster.scale;
        let html = plan.html;
        let printing = tokio::task::spawn_blocking(move || {
            backend.print(&PrintJob {
                html: &html,
                geometry,
                scale,
            })
        });

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(ExportError::Cancelled),
            joined = printing => joined
                .map_err(|e| ExportError::Raster(format!("print task failed: {e}")))??,
        };

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let size = bytes.len();
        let path = self.save(PDF_FILENAME, bytes).await?;
        let artifact = ExportArtifact {
            filename: PDF_FILENAME.to_string(),
            path,
            planned_pages: plan.pages.page_count(),
            bytes: size,
        };

        tracing::info!(
            target_kind = ?target.kind,
            backend = self.backend.name(),
            planned_pages = artifact.planned_pages,
            bytes = artifact.bytes,
            path = %artifact.path.display(),
            "exported PDF"
        );
        Ok(ExportOutcome::Saved(artifact))
    }

    /// Write the preview as a standalone HTML page (`documento.html`).
    pub async fn export_html(&self, rendered: &RenderedDocument) -> Result<ExportArtifact, ExportError> {
        let page = standalone_html(&rendered.html, "documento", None);
        self.save_artifact(HTML_FILENAME, page.into_bytes(), 1).await
    }

    /// Write the raw Markdown text (`documento.md`).
    pub async fn export_markdown(&self, text: &str) -> Result<ExportArtifact, ExportError> {
        self.save_artifact(MARKDOWN_FILENAME, text.as_bytes().to_vec(), 0)
            .await
    }

    async fn save_artifact(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        planned_pages: usize,
    ) -> Result<ExportArtifact, ExportError> {
        let size = bytes.len();
        let path = self.save(filename, bytes).await?;
        tracing::info!(path = %path.display(), bytes = size, "exported {filename}");
        Ok(ExportArtifact {
            filename: filename.to_string(),
            path,
            planned_pages,
            bytes: size,
        })
    }

    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        let sink = Arc::clone(&self.sink);
        let name = filename.to_string();
        let saved = tokio::task::spawn_blocking(move || sink.save(&name, &bytes))
            .await
            .map_err(|e| ExportError::Save {
                filename: filename.to_string(),
                source: io::Error::new(io::ErrorKind::Other, e.to_string()),
            })?;

        saved.map_err(|source| ExportError::Save {
            filename: filename.to_string(),
            source,
        })
    }
}
