//! Editor session controller end to end, on in-memory and on-disk stores.

use crate::common::{docx_with_body, exporter, open_session, ScriptedPrompt, StubBackend};
use mdpad_core::export::ExportOutcome;
use mdpad_core::import::SelectedFile;
use mdpad_core::ir::nodes::Block;
use mdpad_core::session::{EditorSession, SessionSettings};
use mdpad_core::store::{FileStore, MemoryStore, SettingsStore, DOCUMENT_KEY};
use mdpad_core::zoom::{ZoomDirection, ZoomTarget};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_text_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut session = open_session(
        Arc::new(FileStore::open(&path)),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    session.set_text("# Kept\n\nacross restarts");
    session.adjust_zoom(ZoomTarget::Editor, ZoomDirection::In);
    drop(session);

    let reopened = open_session(
        Arc::new(FileStore::open(&path)),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    assert_eq!(reopened.text(), "# Kept\n\nacross restarts");
    assert_eq!(reopened.zoom(ZoomTarget::Editor), 110);
    assert_eq!(reopened.zoom(ZoomTarget::Preview), 100);
}

#[test]
fn test_untypesettable_math_keeps_session_usable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let text = "# Notes\n\n$x^{%a$\n";

    let mut session = open_session(
        Arc::new(FileStore::open(&path)),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    session.set_text(text);
    assert!(session.rendered().html.contains("math-error"));
    assert!(session.rendered().html.contains("<h1>Notes</h1>"));
    drop(session);

    let mut reopened = open_session(
        Arc::new(FileStore::open(&path)),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    assert_eq!(reopened.text(), text);
    assert!(reopened.rendered().html.contains("math-error"));

    reopened.set_text("$x$");
    assert!(!reopened.rendered().html.contains("math-error"));
}

#[test]
fn test_out_of_range_stored_zoom_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    store.save("mdpad.zoom.editor", "400").unwrap();
    store.save("mdpad.zoom.preview", "wide").unwrap();

    let session = open_session(Arc::new(store), ScriptedPrompt::answering(false), dir.path());
    assert_eq!(session.zoom(ZoomTarget::Editor), 160);
    assert_eq!(session.zoom(ZoomTarget::Preview), 100);
}

#[test]
fn test_clear_asks_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let prompt = ScriptedPrompt::answering(true);
    let mut session = open_session(Arc::new(store.clone()), prompt.clone(), dir.path());

    assert!(session.clear());
    assert_eq!(session.text(), "");
    assert_eq!(store.load(DOCUMENT_KEY).as_deref(), Some(""));
    assert_eq!(prompt.confirmations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plain_text_import_replaces_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.md");
    std::fs::write(&path, "# Hello").unwrap();

    let store = MemoryStore::new();
    let mut session = open_session(Arc::new(store.clone()), ScriptedPrompt::answering(false), dir.path());
    session.import_file(&path).await.unwrap();

    assert_eq!(session.text(), "# Hello");
    assert_eq!(store.load(DOCUMENT_KEY).as_deref(), Some("# Hello"));
    match &session.rendered().document.blocks[..] {
        [Block::Heading(h)] => assert_eq!(h.level, 1),
        other => panic!("Expected one heading, got {other:?}"),
    }
}

#[tokio::test]
async fn test_docx_import_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open_session(
        Arc::new(MemoryStore::new()),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hi</w:t></w:r></w:p>"#;
    session
        .import_selected(SelectedFile::new("letter.docx", docx_with_body(body)))
        .await
        .unwrap();

    assert_eq!(session.text().trim(), "**Hi**");
    assert!(session.rendered().html.contains("<strong>Hi</strong>"));
}

#[tokio::test]
async fn test_failed_import_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let prompt = ScriptedPrompt::answering(false);
    let mut session = open_session(Arc::new(MemoryStore::new()), prompt.clone(), dir.path());
    session.set_text("untouched");

    let result = session
        .import_selected(SelectedFile::new("broken.docx", b"not a zip".to_vec()))
        .await;
    assert!(result.is_err());
    assert_eq!(session.text(), "untouched");
    assert_eq!(prompt.alert_count(), 1);
}

#[tokio::test]
async fn test_concurrent_session_exports_save_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::slow(Duration::from_millis(200));
    let mut session = EditorSession::open(
        Arc::new(MemoryStore::new()),
        ScriptedPrompt::answering(false),
        exporter(backend.clone(), dir.path()),
        SessionSettings::default(),
    );
    session.set_text("# T");
    session.toggle_fullscreen();

    let (a, b) = tokio::join!(session.export_pdf(), async {
        // Let the first export take the busy flag
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(session.export_busy());
        session.export_pdf().await
    });

    let saved: Vec<_> = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter_map(|o| match o {
            ExportOutcome::Saved(artifact) => Some(artifact),
            ExportOutcome::Ignored => None,
        })
        .collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].planned_pages, 1);
    assert_eq!(backend.calls(), 1);
    assert!(!session.export_busy());
}

#[test]
fn test_stats_follow_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open_session(
        Arc::new(MemoryStore::new()),
        ScriptedPrompt::answering(false),
        dir.path(),
    );
    session.set_text("one two\nthree");
    let stats = session.stats();
    assert_eq!((stats.words, stats.lines), (3, 2));
}
