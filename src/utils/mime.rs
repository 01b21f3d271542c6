//! File format sniffing for downloaded attachments.

/// Formats the text extractor knows how to handle (or explicitly rejects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    /// An HTML page, usually a sharing/login page served instead of the file.
    Html,
    PlainText,
    Unknown,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
            Self::Html => "HTML",
            Self::PlainText => "TEXT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Get the MIME type for the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Tiff => "image/tiff",
            Self::Html => "text/html",
            Self::PlainText => "text/plain",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether the format is a raster image that needs OCR.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Tiff)
    }
}

/// Detect the format of a file from its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> FileFormat {
    if looks_like_html(bytes) {
        return FileFormat::Html;
    }

    if let Some(kind) = infer::get(bytes) {
        return match kind.mime_type() {
            "application/pdf" => FileFormat::Pdf,
            "image/png" => FileFormat::Png,
            "image/jpeg" => FileFormat::Jpeg,
            "image/tiff" => FileFormat::Tiff,
            "text/html" => FileFormat::Html,
            _ => FileFormat::Unknown,
        };
    }

    if std::str::from_utf8(bytes).is_ok() {
        FileFormat::PlainText
    } else {
        FileFormat::Unknown
    }
}

/// Check the first bytes for an HTML document header.
pub fn looks_like_html(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(64)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
