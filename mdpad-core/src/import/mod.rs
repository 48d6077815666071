//! Document importer: selected file → canonical Markdown
//!
//! | extension                 | kind            | conversion                                   |
//! |---------------------------|-----------------|----------------------------------------------|
//! | `.md` `.markdown` `.txt`  | plain text      | UTF-8 decode, verbatim                       |
//! | `.docx`                   | rich document   | zip + WordprocessingML → HTML → IR → Markdown |
//! | anything else             | unrecognized    | rejected                                     |
//!
//! The kind is decided by extension only (case-insensitive). A failed import
//! returns an error and never produces partial text.

pub mod docx;
pub mod html;
pub mod markdown;

pub use html::html_to_markdown;

use crate::error::ImportError;
use std::path::Path;

/// What an import does with a file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    PlainText,
    RichDocument,
    Unrecognized,
}

impl ImportKind {
    pub fn from_filename(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("md") | Some("markdown") | Some("txt") => ImportKind::PlainText,
            Some("docx") => ImportKind::RichDocument,
            _ => ImportKind::Unrecognized,
        }
    }
}

/// A file the user picked: its name and raw contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> ImportKind {
        ImportKind::from_filename(&self.name)
    }
}

/// Convert a selected file to canonical Markdown, synchronously.
pub fn convert(file: &SelectedFile) -> Result<String, ImportError> {
    match file.kind() {
        ImportKind::PlainText => decode_text(file),
        ImportKind::RichDocument => {
            let provisional = docx::docx_to_html(&file.name, &file.bytes)?;
            Ok(html::html_to_markdown(&provisional)?)
        }
        ImportKind::Unrecognized => Err(ImportError::UnsupportedType(file.name.clone())),
    }
}

fn decode_text(file: &SelectedFile) -> Result<String, ImportError> {
    let bytes = file
        .bytes
        .strip_prefix(b"\xEF\xBB\xBF".as_slice())
        .unwrap_or(&file.bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| ImportError::InvalidText(file.name.clone()))
}

/// Convert a selected file off the async executor.
///
/// Rich documents are decoded on the blocking pool; plain text is cheap enough to
/// decode in place.
pub async fn import_selected(file: SelectedFile) -> Result<String, ImportError> {
    let kind = file.kind();
    let name = file.name.clone();

    let markdown = match kind {
        ImportKind::RichDocument => tokio::task::spawn_blocking(move || convert(&file))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))??,
        _ => convert(&file)?,
    };

    tracing::info!(file = %name, ?kind, chars = markdown.chars().count(), "imported document");
    Ok(markdown)
}

/// Read a file from disk and convert it.
///
/// The extension is checked before reading so an unsupported file is never loaded.
pub async fn import_path(path: &Path) -> Result<String, ImportError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if ImportKind::from_filename(&name) == ImportKind::Unrecognized {
        return Err(ImportError::UnsupportedType(name));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ImportError::Unreadable {
            name: name.clone(),
            source,
        })?;

    import_selected(SelectedFile::new(name, bytes)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ImportKind::from_filename("a.md"), ImportKind::PlainText);
        assert_eq!(ImportKind::from_filename("A.MARKDOWN"), ImportKind::PlainText);
        assert_eq!(ImportKind::from_filename("notes.Txt"), ImportKind::PlainText);
        assert_eq!(ImportKind::from_filename("report.DOCX"), ImportKind::RichDocument);
        assert_eq!(ImportKind::from_filename("image.png"), ImportKind::Unrecognized);
        assert_eq!(ImportKind::from_filename("README"), ImportKind::Unrecognized);
        assert_eq!(ImportKind::from_filename("archive.md.zip"), ImportKind::Unrecognized);
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        let text = "# Hello\n\n* not   normalized *\n";
        let file = SelectedFile::new("x.md", text);
        assert_eq!(convert(&file).unwrap(), text);
    }

    #[test]
    fn test_bom_is_dropped() {
        let file = SelectedFile::new("x.txt", b"\xEF\xBB\xBFhi".to_vec());
        assert_eq!(convert(&file).unwrap(), "hi");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let file = SelectedFile::new("x.md", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(convert(&file), Err(ImportError::InvalidText(_))));
    }

    #[test]
    fn test_unrecognized_is_rejected() {
        let file = SelectedFile::new("x.pdf", b"%PDF".to_vec());
        assert!(matches!(
            convert(&file),
            Err(ImportError::UnsupportedType(name)) if name == "x.pdf"
        ));
    }
}
