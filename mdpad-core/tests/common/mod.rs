//! Shared fixtures: in-memory prompts, PDF backends and `.docx` builders.

#![allow(dead_code)]

use mdpad_core::error::ExportError;
use mdpad_core::export::backend::{PdfBackend, PrintJob};
use mdpad_core::export::{DirectorySink, ExportSettings, Exporter};
use mdpad_core::session::{EditorSession, Prompt, SessionSettings};
use mdpad_core::store::SettingsStore;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const MINIMAL_PDF: &[u8] = b"%PDF-1.7\n%%EOF\n";

/// Answers every confirmation the same way and records alerts.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub answer: bool,
    pub confirmations: AtomicUsize,
    pub alerts: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            ..Default::default()
        })
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, _message: &str) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.answer
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

/// Returns a fixed PDF after an optional delay and counts its calls.
#[derive(Default)]
pub struct StubBackend {
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub last_html: Mutex<Option<String>>,
}

impl StubBackend {
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn print(&self, job: &PrintJob<'_>) -> Result<Vec<u8>, ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_html.lock().unwrap() = Some(job.html.to_string());
        std::thread::sleep(self.delay);
        Ok(MINIMAL_PDF.to_vec())
    }
}

pub fn exporter(backend: Arc<dyn PdfBackend>, dir: &std::path::Path) -> Arc<Exporter> {
    Arc::new(Exporter::new(
        backend,
        Arc::new(DirectorySink::new(dir)),
        ExportSettings::default(),
    ))
}

pub fn open_session(
    store: Arc<dyn SettingsStore>,
    prompt: Arc<dyn Prompt>,
    dir: &std::path::Path,
) -> EditorSession {
    EditorSession::open(
        store,
        prompt,
        exporter(Arc::new(StubBackend::default()), dir),
        SessionSettings::default(),
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

/// Wrap `w:body` content in a WordprocessingML document part.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
    )
}

/// Build a `.docx` archive from `(part name, contents)` pairs.
pub fn docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    for (name, contents) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A `.docx` whose body is `body`.
pub fn docx_with_body(body: &str) -> Vec<u8> {
    docx(&[("word/document.xml", document_xml(body).as_str())])
}
