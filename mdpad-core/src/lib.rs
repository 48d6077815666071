//! Document pipeline for a split-pane Markdown editor
//!
//!     The editor shell (text area, toolbar, dialogs) lives elsewhere. This crate holds
//!     everything behind it: the persistent store, the importers, the render pipeline, the
//!     PDF exporter and the session controller that ties them together.
//!
//! Architecture
//!
//!     input ──► session ──► store (mirror of text and zoom)
//!                  │
//!                  ├──► render pipeline ──► rendered document (IR + HTML)
//!                  │
//!                  └──► exporter ──► documento.pdf
//!
//!     All formats go through one intermediate representation (./ir). Markdown is parsed
//!     into it with comrak, HTML with html5ever, and it is serialized back to Markdown with
//!     comrak's CommonMark formatter. Rich documents (.docx) are first mapped to HTML, so
//!     they reuse the HTML path.
//!
//!     The file structure:
//!     .
//!     ├── error.rs
//!     ├── ir                  # Intermediate representation and visitors
//!     ├── render              # Markdown → IR → HTML, math typesetting
//!     ├── import              # .md/.txt/.docx → canonical Markdown
//!     ├── export              # layout, pagination, PDF backends, sinks
//!     ├── store.rs            # key/value persistence
//!     ├── zoom.rs             # zoom bounds and steps
//!     ├── sample.rs           # first-run document
//!     └── session.rs          # editor session controller
//!
//! Library Choices
//!
//!     We never parse Markdown, HTML, XML or LaTeX by hand: comrak, html5ever, roxmltree
//!     and pulldown-latex do that, and this crate only adapts between their trees. PDF
//!     output shells out to a headless Chrome (feature `native-export`), behind the
//!     [`export::backend::PdfBackend`] trait so tests can swap it out.
//!
//!     This is a pure lib: no printing, no environment lookups beyond the Chrome binary
//!     detection. Logging goes through `tracing`; the binary decides where it ends up.

pub mod error;
pub mod export;
pub mod import;
pub mod ir;
pub mod render;
pub mod sample;
pub mod session;
pub mod store;
pub mod zoom;

pub use error::{ExportError, FormatError, ImportError, StoreError};
pub use export::{
    ArtifactSink, DirectorySink, ExportArtifact, ExportOutcome, ExportSettings, Exporter,
    RenderTarget, TargetKind,
};
pub use import::{ImportKind, SelectedFile};
pub use render::{Pipeline, RenderOptions, RenderedDocument};
pub use session::{DocumentStats, EditorSession, Prompt, SessionSettings};
pub use store::{FileStore, MemoryStore, SettingsStore};
pub use zoom::{ZoomBounds, ZoomDirection, ZoomTarget};
