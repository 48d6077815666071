//! PDF backends: print HTML → PDF bytes.
//!
//! The Chrome backend writes the print page to a temp dir and shells out to a
//! Chrome/Chromium binary running in headless mode to print it to PDF.

use super::geometry::PageGeometry;
use crate::error::ExportError;

/// Everything a backend needs to print one document.
#[derive(Debug, Clone, Copy)]
pub struct PrintJob<'a> {
    pub html: &'a str,
    pub geometry: PageGeometry,
    /// Device pixel oversampling factor, at least 2.
    pub scale: u32,
}

/// Turns a print page into PDF bytes. Called from a blocking thread.
pub trait PdfBackend: Send + Sync {
    fn name(&self) -> &str;

    fn print(&self, job: &PrintJob<'_>) -> Result<Vec<u8>, ExportError>;
}

/// Reject output that is not a PDF file.
pub(crate) fn check_pdf(bytes: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    if bytes.starts_with(b"%PDF") {
        Ok(bytes)
    } else {
        Err(ExportError::Serialize(format!(
            "backend output is not a PDF ({} bytes)",
            bytes.len()
        )))
    }
}

#[cfg(feature = "native-export")]
pub use chrome::{ChromeBackend, CHROME_ENV};

#[cfg(feature = "native-export")]
mod chrome {
    use super::{PdfBackend, PrintJob};
    use crate::error::ExportError;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::process::Command;
    use tempfile::tempdir;
    use url::Url;
    use which::which;

    /// Environment variable that overrides Chrome detection.
    pub const CHROME_ENV: &str = "MDPAD_CHROME_BIN";

    /// Headless Chrome/Chromium `--print-to-pdf` backend.
    #[derive(Debug, Clone, Default)]
    pub struct ChromeBackend {
        binary: Option<PathBuf>,
    }

    impl ChromeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Use this binary instead of searching for one.
        pub fn with_binary(path: impl Into<PathBuf>) -> Self {
            Self {
                binary: Some(path.into()),
            }
        }

        fn binary(&self) -> Result<PathBuf, ExportError> {
            match &self.binary {
                Some(path) => Ok(path.clone()),
                None => resolve_chrome_binary(),
            }
        }
    }

    impl PdfBackend for ChromeBackend {
        fn name(&self) -> &str {
            "chrome"
        }

        fn print(&self, job: &PrintJob<'_>) -> Result<Vec<u8>, ExportError> {
            let chrome = self.binary()?;
            let temp_dir =
                tempdir().map_err(|e| ExportError::Raster(format!("Temp dir error: {e}")))?;
            let html_path = temp_dir.path().join("mdpad-export.html");
            fs::write(&html_path, job.html).map_err(|e| ExportError::Raster(e.to_string()))?;

            let pdf_path = temp_dir.path().join("mdpad-export.pdf");
            let file_url = Url::from_file_path(&html_path).map_err(|_| {
                ExportError::Raster("Failed to construct file:// URL for HTML input".to_string())
            })?;

            let (w, h) = job.geometry.viewport_px();
            let status = Command::new(&chrome)
                .arg("--headless")
                .arg("--disable-gpu")
                .arg("--no-sandbox")
                .arg("--disable-dev-shm-usage")
                .arg("--print-to-pdf-no-header")
                .arg(format!("--force-device-scale-factor={}", job.scale))
                .arg(format!("--print-to-pdf={}", pdf_path.display()))
                .arg(format!("--window-size={w},{h}"))
                .arg(file_url.as_str())
                .status()
                .map_err(|e| {
                    ExportError::Raster(format!(
                        "Failed to launch Chrome ({}): {}",
                        chrome.display(),
                        e
                    ))
                })?;

            if !status.success() {
                return Err(ExportError::Raster(format!(
                    "Chrome exited with status {status}"
                )));
            }

            let bytes = fs::read(&pdf_path)
                .map_err(|e| ExportError::Serialize(format!("no PDF produced: {e}")))?;
            super::check_pdf(bytes)
        }
    }

    fn resolve_chrome_binary() -> Result<PathBuf, ExportError> {
        for var in [CHROME_ENV, "GOOGLE_CHROME_BIN", "CHROME_BIN"] {
            if let Some(path) = env::var_os(var) {
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        for candidate in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "chrome",
            "msedge",
        ] {
            if let Ok(path) = which(candidate) {
                return Ok(path);
            }
        }

        #[cfg(target_os = "macos")]
        {
            let candidate =
                PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        #[cfg(target_os = "windows")]
        {
            let candidates = [
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ];
            for candidate in candidates {
                let path = PathBuf::from(candidate);
                if path.exists() {
                    return Ok(path);
                }
            }
        }

        Err(ExportError::Raster(format!(
            "Unable to locate a Chrome/Chromium binary. Set {CHROME_ENV} to override the detection."
        )))
    }
}
