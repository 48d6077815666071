//! Editor session controller.
//!
//! The session owns the document text, its rendered form, the zoom levels and the
//! fullscreen flag. Every text change is mirrored into the store in the same call
//! and re-rendered. Store failures are logged and otherwise ignored; import and
//! export failures are shown through the [`Prompt`] and returned to the caller.

use crate::error::{ExportError, ImportError};
use crate::export::{ExportOutcome, Exporter, RenderTarget, TargetKind};
use crate::import::{self, SelectedFile};
use crate::render::{Pipeline, RenderOptions, RenderedDocument};
use crate::sample::SAMPLE_DOCUMENT;
use crate::store::{save_or_warn, SettingsStore, DOCUMENT_KEY};
use crate::zoom::{ZoomBounds, ZoomDirection, ZoomLevels, ZoomTarget};
use std::path::Path;
use std::sync::Arc;

pub const CLEAR_PROMPT: &str = "Clear the whole document? This cannot be undone.";

/// User-facing dialogs.
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question. `true` means yes.
    fn confirm(&self, message: &str) -> bool;

    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSettings {
    pub zoom: ZoomBounds,
    /// One zoom value for both panes, stored under a single key.
    pub shared_zoom: bool,
    pub render: RenderOptions,
}

/// Word, character and line counts of the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
}

impl DocumentStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
            lines: text.lines().count(),
        }
    }
}

pub struct EditorSession {
    store: Arc<dyn SettingsStore>,
    prompt: Arc<dyn Prompt>,
    exporter: Arc<Exporter>,
    pipeline: Pipeline,
    settings: SessionSettings,
    text: String,
    rendered: RenderedDocument,
    zoom: ZoomLevels,
    fullscreen: bool,
}

impl EditorSession {
    /// Start a session from whatever the store holds.
    ///
    /// A stored document is used even when it is empty; the sample document is only
    /// shown when nothing was ever saved.
    pub fn open(
        store: Arc<dyn SettingsStore>,
        prompt: Arc<dyn Prompt>,
        exporter: Arc<Exporter>,
        settings: SessionSettings,
    ) -> Self {
        let text = store
            .load(DOCUMENT_KEY)
            .unwrap_or_else(|| SAMPLE_DOCUMENT.to_string());

        let bounds = settings.zoom;
        let load = |target: ZoomTarget| {
            bounds.parse(store.load(target.key(settings.shared_zoom)).as_deref())
        };
        let zoom = ZoomLevels {
            editor: load(ZoomTarget::Editor),
            preview: load(ZoomTarget::Preview),
        };

        let pipeline = Pipeline::new(settings.render);
        let rendered = pipeline.render(&text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not render stored document");
            RenderedDocument::default()
        });

        tracing::debug!(
            chars = text.len(),
            editor_zoom = zoom.editor,
            preview_zoom = zoom.preview,
            "session opened"
        );

        Self {
            store,
            prompt,
            exporter,
            pipeline,
            settings,
            text,
            rendered,
            zoom,
            fullscreen: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rendered(&self) -> &RenderedDocument {
        &self.rendered
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Replace the document text, persist it and re-render.
    ///
    /// When rendering fails the previous render stays visible.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        save_or_warn(self.store.as_ref(), DOCUMENT_KEY, &self.text);

        match self.pipeline.render(&self.text) {
            Ok(rendered) => self.rendered = rendered,
            Err(e) => tracing::warn!(error = %e, "render failed, keeping last render"),
        }
    }

    /// Empty the document after the user confirms. Returns whether it was cleared.
    pub fn clear(&mut self) -> bool {
        if !self.prompt.confirm(CLEAR_PROMPT) {
            return false;
        }
        self.set_text("");
        true
    }

    /// Import a file from disk, replacing the document on success.
    pub async fn import_file(&mut self, path: &Path) -> Result<(), ImportError> {
        let result = import::import_path(path).await;
        self.finish_import(result)
    }

    /// Import a file the user picked, replacing the document on success.
    pub async fn import_selected(&mut self, file: SelectedFile) -> Result<(), ImportError> {
        let result = import::import_selected(file).await;
        self.finish_import(result)
    }

    fn finish_import(&mut self, result: Result<String, ImportError>) -> Result<(), ImportError> {
        match result {
            Ok(markdown) => {
                self.set_text(markdown);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "import failed");
                self.prompt.alert(&format!("Could not import the file: {e}"));
                Err(e)
            }
        }
    }

    pub fn zoom(&self, target: ZoomTarget) -> i32 {
        self.zoom.get(target)
    }

    pub fn zoom_levels(&self) -> ZoomLevels {
        self.zoom
    }

    /// Step one pane's zoom in or out. Returns the new value.
    pub fn adjust_zoom(&mut self, target: ZoomTarget, direction: ZoomDirection) -> i32 {
        let next = self
            .settings
            .zoom
            .step_from(self.zoom.get(target), direction);
        self.apply_zoom(target, next)
    }

    /// Return one pane to the default zoom.
    pub fn reset_zoom(&mut self, target: ZoomTarget) -> i32 {
        self.apply_zoom(target, self.settings.zoom.default)
    }

    fn apply_zoom(&mut self, target: ZoomTarget, value: i32) -> i32 {
        let value = self.settings.zoom.clamp(value);
        if self.settings.shared_zoom {
            self.zoom = ZoomLevels {
                editor: value,
                preview: value,
            };
        } else {
            self.zoom.set(target, value);
        }

        save_or_warn(
            self.store.as_ref(),
            target.key(self.settings.shared_zoom),
            &value.to_string(),
        );
        value
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Background scrolling is locked while fullscreen is shown.
    pub fn scroll_locked(&self) -> bool {
        self.fullscreen
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    /// Escape leaves fullscreen. Returns whether it did anything.
    pub fn handle_escape(&mut self) -> bool {
        let was = self.fullscreen;
        self.exit_fullscreen();
        was
    }

    pub fn export_busy(&self) -> bool {
        self.exporter.is_busy()
    }

    /// The render target an export would capture right now.
    pub fn render_target(&self) -> RenderTarget {
        let kind = if self.fullscreen {
            TargetKind::Fullscreen
        } else {
            TargetKind::Preview
        };
        RenderTarget::new(kind, self.rendered.clone())
    }

    /// Export the visible render target to `documento.pdf`.
    ///
    /// Takes `&self` so a second request can arrive while one is running; it is
    /// ignored by the exporter.
    pub async fn export_pdf(&self) -> Result<ExportOutcome, ExportError> {
        let outcome = self.exporter.export(self.render_target()).await;
        if let Err(e) = &outcome {
            self.prompt.alert(&format!("Could not export the PDF: {e}"));
        }
        outcome
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::of(&self.text)
    }
}
