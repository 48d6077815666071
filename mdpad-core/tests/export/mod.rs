//! Exporter: rendered document → paginated `documento.pdf`

use crate::common::{exporter, StubBackend, MINIMAL_PDF};
use mdpad_core::export::paginate::Pagination;
use mdpad_core::export::{
    DirectorySink, ExportOutcome, ExportSettings, Exporter, RenderTarget, TargetKind,
};
use mdpad_core::render::Pipeline;
use std::sync::Arc;
use std::time::Duration;

fn target(md: &str) -> RenderTarget {
    RenderTarget::new(TargetKind::Preview, Pipeline::default().render(md).unwrap())
}

fn long_document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|n| format!("Paragraph number {n} of a long document.\n\n"))
        .collect()
}

#[test]
fn test_short_document_is_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = exporter(Arc::new(StubBackend::default()), dir.path());
    let plan = exporter.prepare(&target("# T").document).unwrap();
    assert_eq!(plan.pages.page_count(), 1);
    assert_eq!(plan.raster.background, [255, 255, 255]);
    assert!(plan.raster.scale >= 2);
}

#[test]
fn test_raster_is_placed_at_printable_width() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = exporter(Arc::new(StubBackend::default()), dir.path());
    let plan = exporter.prepare(&target(&long_document(20)).document).unwrap();

    let (width_mm, height_mm) = plan.placed_mm;
    assert_eq!(width_mm, 190.0);
    let ratio = f64::from(plan.raster.height_px) / f64::from(plan.raster.width_px);
    assert!((height_mm - width_mm * ratio).abs() < 1e-9);
}

#[test]
fn test_long_document_places_every_block_once() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = exporter(Arc::new(StubBackend::default()), dir.path());
    let rendered = target(&long_document(200)).document;
    let plan = exporter.prepare(&rendered).unwrap();

    assert!(plan.pages.page_count() > 1, "{}", plan.pages);
    let placed: Vec<usize> = plan
        .pages
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter().copied())
        .collect();
    assert_eq!(placed, (0..rendered.block_count()).collect::<Vec<_>>());
    assert_eq!(
        plan.html.matches("<section class=\"page\">").count(),
        plan.pages.page_count()
    );
}

#[test]
fn test_offset_strategy_slices_one_flow() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExportSettings {
        pagination: Pagination::Offset,
        ..Default::default()
    };
    let exporter = Exporter::new(
        Arc::new(StubBackend::default()),
        Arc::new(DirectorySink::new(dir.path())),
        settings,
    );
    let plan = exporter.prepare(&target(&long_document(200)).document).unwrap();
    assert!(plan.pages.page_count() > 1);
    assert_eq!(plan.html.matches("<section class=\"page\">").count(), 1);
}

#[test]
fn test_scale_is_raised_to_two() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExportSettings {
        scale: 1,
        ..Default::default()
    };
    let exporter = Exporter::new(
        Arc::new(StubBackend::default()),
        Arc::new(DirectorySink::new(dir.path())),
        settings,
    );
    assert_eq!(exporter.prepare(&target("x").document).unwrap().raster.scale, 2);
}

#[tokio::test]
async fn test_concurrent_exports_save_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::slow(Duration::from_millis(200));
    let exporter = exporter(backend.clone(), dir.path());

    let (first, second) = tokio::join!(
        exporter.export(target("# One")),
        exporter.export(target("# Two"))
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    let saved = outcomes
        .iter()
        .filter(|o| matches!(o, ExportOutcome::Saved(_)))
        .count();
    assert_eq!(saved, 1);
    assert!(outcomes.contains(&ExportOutcome::Ignored));
    assert_eq!(backend.calls(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    assert!(!exporter.is_busy());
}

#[tokio::test]
async fn test_busy_flag_is_released_between_exports() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::default());
    let exporter = exporter(backend.clone(), dir.path());

    for _ in 0..2 {
        let outcome = exporter.export(target("# Again")).await.unwrap();
        assert!(matches!(outcome, ExportOutcome::Saved(_)));
    }
    assert_eq!(backend.calls(), 2);
    assert_eq!(
        std::fs::read(dir.path().join("documento.pdf")).unwrap(),
        MINIMAL_PDF
    );
}

#[tokio::test]
async fn test_print_html_carries_page_rules() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::default());
    let exporter = exporter(backend.clone(), dir.path());
    exporter
        .export(target("| a |\n|---|\n| 1 |\n"))
        .await
        .unwrap();

    let html = backend.last_html.lock().unwrap().clone().unwrap();
    assert!(html.contains("size: 210mm 297mm"));
    assert!(html.contains("break-after: page"));
    assert!(html.contains("<table>"));
}

#[tokio::test]
async fn test_html_and_markdown_exports() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = exporter(Arc::new(StubBackend::default()), dir.path());
    let rendered = Pipeline::default().render("# Page").unwrap();

    let html = exporter.export_html(&rendered).await.unwrap();
    assert_eq!(html.filename, "documento.html");
    let page = std::fs::read_to_string(&html.path).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<h1>Page</h1>"));

    let md = exporter.export_markdown("# Page").await.unwrap();
    assert_eq!(std::fs::read_to_string(md.path).unwrap(), "# Page");
}

#[cfg(all(unix, feature = "native-export"))]
mod unix {
    use super::target;
    use mdpad_core::export::backend::ChromeBackend;
    use mdpad_core::export::{DirectorySink, ExportOutcome, ExportSettings, Exporter};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_stub_chrome() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let script_path = dir.path().join("fake-chrome.sh");
        let script = r#"#!/bin/sh
OUTPUT=""
for arg in "$@"; do
  case $arg in
    --print-to-pdf=*)
      OUTPUT="${arg#*=}"
      ;;
  esac
done
if [ -z "$OUTPUT" ]; then
  echo "missing output" >&2
  exit 1
fi
printf '%%PDF-1.7\n%%%%EOF\n' > "$OUTPUT"
exit 0
"#;
        fs::write(&script_path, script).unwrap();
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
        (dir, script_path)
    }

    #[tokio::test]
    async fn chrome_backend_uses_stub() {
        let (_chrome_dir, chrome_stub) = write_stub_chrome();
        let out = tempdir().unwrap();
        let exporter = Exporter::new(
            Arc::new(ChromeBackend::with_binary(chrome_stub)),
            Arc::new(DirectorySink::new(out.path())),
            ExportSettings::default(),
        );

        let outcome = exporter.export(target("# Printed\n")).await.unwrap();
        let ExportOutcome::Saved(artifact) = outcome else {
            panic!("Expected a saved PDF");
        };
        assert_eq!(artifact.filename, "documento.pdf");
        assert!(fs::read(artifact.path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn failing_chrome_leaves_no_file() {
        let out = tempdir().unwrap();
        let exporter = Exporter::new(
            Arc::new(ChromeBackend::with_binary("/bin/false")),
            Arc::new(DirectorySink::new(out.path())),
            ExportSettings::default(),
        );

        assert!(exporter.export(target("x")).await.is_err());
        assert!(!exporter.is_busy());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }
}

#[cfg(not(all(unix, feature = "native-export")))]
#[test]
fn chrome_stub_skipped() {
    eprintln!("Skipping Chrome tests (native-export feature or Unix required)");
}
