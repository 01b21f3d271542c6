//! Text extraction using pdftotext and Tesseract.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use super::TextExtractionService;
use crate::models::DocumentType;
use crate::utils::{looks_like_html, sniff_format, FileFormat};

/// Files smaller than this cannot be a real document.
const MIN_DOCUMENT_BYTES: u64 = 100;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File is an HTML page, not a document")]
    HtmlDetected,

    #[error("No text could be extracted")]
    NoText,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Document too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Document too small: {0} bytes")]
    TooSmall(u64),

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Extraction service throttled: {0}")]
    Throttled(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Short human-readable label used in output status values.
    pub fn category(&self) -> &'static str {
        match self {
            Self::HtmlDetected => "Archivo HTML",
            Self::NoText => "Sin Texto",
            Self::UnsupportedType(_) => "Formato No Soportado",
            Self::TooLarge { .. } => "Archivo Muy Grande",
            Self::TooSmall(_) => "Archivo Muy Pequeño",
            Self::Timeout(_) => "Tiempo Agotado",
            Self::Throttled(_) => "Servicio Saturado",
            Self::ToolNotFound(_) | Self::Failed(_) | Self::Io(_) => "Error de Extraccion",
        }
    }
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => Err(ExtractionError::Failed(format!(
            "{}: {}",
            error_prefix,
            String::from_utf8_lossy(&output.stderr).trim()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

fn content_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Extracts text locally with external tools.
#[derive(Debug, Clone)]
pub struct LocalTextExtractor {
    /// Below this many non-whitespace chars the PDF text layer is considered sparse.
    min_chars: usize,
    tesseract_lang: String,
    max_bytes: u64,
    timeout: Duration,
}

impl Default for LocalTextExtractor {
    fn default() -> Self {
        Self {
            min_chars: 100,
            tesseract_lang: "spa".to_string(),
            max_bytes: 500 * 1024 * 1024,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LocalTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Set Tesseract language.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.tesseract_lang = lang.to_string();
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject files that cannot be a scanned document and detect the format.
    pub fn inspect(&self, path: &Path) -> Result<FileFormat, ExtractionError> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(ExtractionError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let bytes = std::fs::read(path)?;
        if looks_like_html(&bytes) {
            return Err(ExtractionError::HtmlDetected);
        }
        if size < MIN_DOCUMENT_BYTES {
            return Err(ExtractionError::TooSmall(size));
        }

        match sniff_format(&bytes) {
            FileFormat::Unknown | FileFormat::Html => Err(ExtractionError::UnsupportedType(
                infer::get(&bytes)
                    .map(|k| k.mime_type().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
            format => Ok(format),
        }
    }

    /// Extract text from a file.
    ///
    /// External tools run as child processes that are killed when this
    /// future is dropped, so a timed-out extraction leaves nothing running.
    pub async fn extract_file(&self, path: &Path) -> Result<String, ExtractionError> {
        let extractor = self.clone();
        let owned = path.to_path_buf();
        let format = tokio::task::spawn_blocking(move || extractor.inspect(&owned))
            .await
            .map_err(|e| ExtractionError::Failed(format!("inspection task failed: {}", e)))??;
        tracing::debug!(format = format.as_str(), "Extracting {}", path.display());

        let text = match format {
            FileFormat::Pdf => self.extract_pdf(path).await?,
            FileFormat::PlainText => tokio::fs::read_to_string(path).await?,
            f if f.is_image() => self.run_tesseract(path).await?,
            other => return Err(ExtractionError::UnsupportedType(other.mime_type().to_string())),
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        Ok(text)
    }

    /// pdftotext first; OCR when the text layer is sparse and OCR finds more.
    async fn extract_pdf(&self, path: &Path) -> Result<String, ExtractionError> {
        let layer = self.run_pdftotext(path).await?;
        let layer_chars = content_chars(&layer);
        if layer_chars >= self.min_chars {
            return Ok(layer);
        }

        match self.ocr_pdf(path).await {
            Ok(ocr_text) if content_chars(&ocr_text) > layer_chars => Ok(ocr_text),
            Ok(_) => Ok(layer),
            Err(e) => {
                tracing::debug!("OCR failed: {}, using pdftotext result", e);
                Ok(layer)
            }
        }
    }

    /// Run pdftotext on a PDF file.
    async fn run_pdftotext(&self, path: &Path) -> Result<String, ExtractionError> {
        let output = tool_command("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output()
            .await;

        handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
    }

    /// Rasterize every page with pdftoppm and OCR them in order.
    async fn ocr_pdf(&self, path: &Path) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;

        let output = tool_command("pdftoppm")
            .args(["-png", "-r", "300"])
            .arg(path)
            .arg(temp_dir.path().join("page"))
            .output()
            .await;
        handle_cmd_output(output, "pdftoppm (install poppler-utils)", "pdftoppm failed")?;

        let mut images: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(ExtractionError::Failed(
                "No images generated from PDF".to_string(),
            ));
        }

        let mut pages = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            match self.run_tesseract(image).await {
                Ok(text) => pages.push(text),
                Err(e) => tracing::warn!("OCR failed for page {}: {}", i + 1, e),
            }
        }

        Ok(pages.join("\n\n"))
    }

    /// Run Tesseract OCR on an image.
    async fn run_tesseract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output = tool_command("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.tesseract_lang])
            .output()
            .await;

        handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdftotext", "pdftoppm", "tesseract"]
            .iter()
            .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
            .collect()
    }
}

/// Command for an external tool. The child is killed if its future is dropped.
fn tool_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.kill_on_drop(true);
    cmd
}

#[async_trait]
impl TextExtractionService for LocalTextExtractor {
    async fn extract(&self, path: &Path, doc_type: DocumentType) -> Result<String, ExtractionError> {
        match tokio::time::timeout(self.timeout, self.extract_file(path)).await {
            Ok(result) => {
                if let Ok(text) = &result {
                    tracing::debug!(
                        doc_type = doc_type.as_str(),
                        chars = text.len(),
                        "Extracted text from {}",
                        path.display()
                    );
                }
                result
            }
            Err(_) => Err(ExtractionError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), bytes).unwrap();
        file
    }

    #[test]
    fn test_rejects_html() {
        let file = write_temp(b"<!DOCTYPE html><html><body>Google Drive - Access denied</body></html>");
        let err = LocalTextExtractor::new().inspect(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::HtmlDetected));
        assert_eq!(err.category(), "Archivo HTML");
    }

    #[test]
    fn test_size_bounds() {
        let small = write_temp(b"%PDF-1.4 tiny");
        assert!(matches!(
            LocalTextExtractor::new().inspect(small.path()),
            Err(ExtractionError::TooSmall(_))
        ));

        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend(std::iter::repeat(b'x').take(500));
        let big = write_temp(&pdf);
        let extractor = LocalTextExtractor::new().with_max_bytes(200);
        assert!(matches!(
            extractor.inspect(big.path()),
            Err(ExtractionError::TooLarge { limit: 200, .. })
        ));
    }

    #[test]
    fn test_unsupported_binary() {
        let mut zip = b"PK\x03\x04".to_vec();
        zip.extend(std::iter::repeat(0xFFu8).take(200));
        let file = write_temp(&zip);
        let err = LocalTextExtractor::new().inspect(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_plain_text_is_read_directly() {
        let text = "REPÚBLICA DE COLOMBIA cédula de ciudadanía ".repeat(5);
        let file = write_temp(text.as_bytes());
        let out = LocalTextExtractor::new()
            .extract(file.path(), DocumentType::Cedula)
            .await
            .unwrap();
        assert_eq!(out, text);
    }

    #[tokio::test]
    async fn test_whitespace_only_is_no_text() {
        let file = write_temp(" \n".repeat(80).as_bytes());
        let err = LocalTextExtractor::new()
            .extract(file.path(), DocumentType::Icfes)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_tool_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 0.5; touch '{}'", marker.display());

        let mut cmd = tool_command("sh");
        cmd.arg("-c").arg(&script);
        let result = tokio::time::timeout(Duration::from_millis(100), cmd.output()).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!marker.exists());
    }

    #[test]
    fn test_check_tools() {
        let tools = LocalTextExtractor::check_tools();
        assert_eq!(tools.len(), 3);
    }
}
