//! Importers: plain text and `.docx` → canonical Markdown

use crate::common::{docx, docx_with_body, document_xml};
use mdpad_core::error::ImportError;
use mdpad_core::import::{self, convert, html_to_markdown, SelectedFile};
use mdpad_core::ir::nodes::Block;
use mdpad_core::render::Pipeline;

fn import_docx(bytes: Vec<u8>) -> String {
    convert(&SelectedFile::new("doc.docx", bytes)).expect("docx should import")
}

fn render(md: &str) -> String {
    Pipeline::default().render(md).expect("render should succeed").html
}

#[test]
fn test_plain_text_is_verbatim() {
    let md = convert(&SelectedFile::new("hello.md", "# Hello")).unwrap();
    assert_eq!(md, "# Hello");
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let err = convert(&SelectedFile::new("bad.txt", vec![0xff, 0xfe, 0x41])).unwrap_err();
    assert!(matches!(err, ImportError::InvalidText(name) if name == "bad.txt"));
}

#[test]
fn test_docx_bold_run() {
    let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hi</w:t></w:r></w:p>"#;
    let md = import_docx(docx_with_body(body));
    assert_eq!(md.trim(), "**Hi**");
    assert!(!md.contains('<'));
}

#[test]
fn test_docx_marks_keep_edge_spaces_outside() {
    let body = r#"<w:p>
  <w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Hi </w:t></w:r>
  <w:r><w:t>there</w:t></w:r>
  <w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve"> again</w:t></w:r>
</w:p>"#;
    let md = import_docx(docx_with_body(body));
    assert_eq!(md.trim(), "**Hi** there *again*");

    let html = render(&md);
    assert!(html.contains("<strong>Hi</strong>"), "{html}");
    assert!(html.contains("<em>again</em>"), "{html}");
    assert!(!html.contains('*'), "{html}");
}

#[test]
fn test_docx_headings_and_marks() {
    let body = r#"
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>
<w:p><w:pPr><w:outlineLvl w:val="1"/></w:pPr><w:r><w:t>Section</w:t></w:r></w:p>
<w:p>
  <w:r><w:t xml:space="preserve">plain </w:t></w:r>
  <w:r><w:rPr><w:i/></w:rPr><w:t>slanted</w:t></w:r>
  <w:r><w:t xml:space="preserve"> and </w:t></w:r>
  <w:r><w:rPr><w:strike/></w:rPr><w:t>struck</w:t></w:r>
</w:p>"#;
    let md = import_docx(docx_with_body(body));
    assert!(md.contains("# Title"), "{md}");
    assert!(md.contains("## Section"), "{md}");
    assert!(md.contains("plain *slanted* and ~struck~"), "{md}");

    let html = render(&md);
    assert!(html.contains("<em>slanted</em>"), "{html}");
    assert!(html.contains("<del>struck</del>"), "{html}");
}

#[test]
fn test_docx_lists_use_numbering_part() {
    let numbering = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
  <w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;
    let item = |num: u8, text: &str| {
        format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="{num}"/></w:numPr></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
        )
    };
    let body = [item(1, "first"), item(1, "second"), item(2, "dot")].concat();
    let bytes = docx(&[
        ("word/document.xml", document_xml(&body).as_str()),
        ("word/numbering.xml", numbering),
    ]);

    let md = import_docx(bytes);
    assert!(md.contains("- dot"), "{md}");

    let rendered = Pipeline::default().render(&md).unwrap();
    let lists: Vec<_> = rendered
        .document
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::List(list) => Some((list.ordered, list.items.len())),
            _ => None,
        })
        .collect();
    assert_eq!(lists, vec![(true, 2), (false, 1)], "{md}");
    assert!(rendered.html.contains("<li>first</li>"), "{}", rendered.html);
}

#[test]
fn test_docx_hyperlink_and_table() {
    let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;
    let body = r#"
<w:p><w:hyperlink r:id="rId9"><w:r><w:t>site</w:t></w:r></w:hyperlink></w:p>
<w:tbl>
  <w:tr><w:tc><w:p><w:r><w:t>name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>qty</w:t></w:r></w:p></w:tc></w:tr>
  <w:tr><w:tc><w:p><w:r><w:t>pear</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>3</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>"#;
    let bytes = docx(&[
        ("word/document.xml", document_xml(body).as_str()),
        ("word/_rels/document.xml.rels", rels),
    ]);

    let md = import_docx(bytes);
    assert!(md.contains("[site](https://example.com)"), "{md}");
    assert!(md.contains("| name"), "{md}");
    assert!(md.contains("| pear"), "{md}");
}

#[test]
fn test_docx_without_document_part_is_corrupt() {
    let bytes = docx(&[("word/styles.xml", "<w:styles/>")]);
    let err = convert(&SelectedFile::new("empty.docx", bytes)).unwrap_err();
    assert!(matches!(err, ImportError::CorruptContainer { .. }));
}

#[test]
fn test_docx_with_broken_xml_is_corrupt() {
    let bytes = docx(&[("word/document.xml", "<w:document><w:body>")]);
    let err = convert(&SelectedFile::new("broken.docx", bytes)).unwrap_err();
    assert!(matches!(err, ImportError::CorruptContainer { .. }));
}

#[test]
fn test_html_to_markdown_is_public() {
    let md = html_to_markdown("<h2>Notes</h2><p>a <em>b</em></p>").unwrap();
    assert_eq!(md, "## Notes\n\na *b*\n");
}

#[tokio::test]
async fn test_import_path_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.markdown");
    std::fs::write(&path, "- a\n- b\n").unwrap();
    assert_eq!(import::import_path(&path).await.unwrap(), "- a\n- b\n");
}

#[tokio::test]
async fn test_import_path_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = import::import_path(&dir.path().join("gone.md")).await;
    assert!(matches!(missing, Err(ImportError::Unreadable { .. })));

    let image = dir.path().join("photo.png");
    std::fs::write(&image, [0u8; 4]).unwrap();
    let unsupported = import::import_path(&image).await;
    assert!(matches!(unsupported, Err(ImportError::UnsupportedType(_))));
}

#[tokio::test]
async fn test_docx_import_runs_off_the_executor() {
    let body = r#"<w:p><w:r><w:t>async</w:t></w:r></w:p>"#;
    let md = import::import_selected(SelectedFile::new("a.DOCX", docx_with_body(body)))
        .await
        .unwrap();
    assert_eq!(md.trim(), "async");
}
