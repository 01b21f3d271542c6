//! Human-readable status values for documents that could not be checked.
//!
//! Failures are never propagated out of a document task; they become a
//! `"<Category> - Revision Manual"` value in the document's status field.

use serde::Serialize;

use crate::models::status::manual_review;
use crate::ocr::ExtractionError;

/// Category for a tier that ran out of time.
pub const TIMED_OUT: &str = "Tiempo de Procesamiento Agotado";
/// Category for a task that panicked or was lost.
pub const INTERNAL_ERROR: &str = "Error Interno";
/// Category for a download reported successful but without a local file.
pub const FILE_UNAVAILABLE: &str = "Archivo No Disponible";

/// Why a document could not be fetched, derived from the fetcher's error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    PermissionDenied,
    NotFound,
    Authentication,
    Timeout,
    RateLimited,
    Network,
    InvalidUrl,
    Other,
}

impl FetchErrorKind {
    /// Categorize a fetch error detail. Recognizes both the fetcher's error
    /// codes (`PERMISSION_DENIED: ...`) and raw HTTP/network messages.
    pub fn from_detail(detail: &str) -> Self {
        let lower = detail.to_lowercase();
        if contains_any(&lower, &["permission_denied", "insufficient permissions", "forbidden"])
            || has_code(&lower, "403")
        {
            Self::PermissionDenied
        } else if contains_any(&lower, &["file_not_found", "not found"]) || has_code(&lower, "404") {
            Self::NotFound
        } else if contains_any(&lower, &["auth_error", "unauthorized"]) || has_code(&lower, "401") {
            Self::Authentication
        } else if contains_any(&lower, &["timeout", "timed out"]) {
            Self::Timeout
        } else if contains_any(&lower, &["rate_limit", "rate limit", "quota"])
            || has_code(&lower, "429")
        {
            Self::RateLimited
        } else if contains_any(&lower, &["network", "enotfound", "econnreset", "econnrefused"]) {
            Self::Network
        } else if contains_any(&lower, &["invalid_url", "invalid url", "url inválida", "url invalida"])
        {
            Self::InvalidUrl
        } else {
            Self::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Sin Permisos",
            Self::NotFound => "Archivo No Encontrado",
            Self::Authentication => "Error de Autenticacion",
            Self::Timeout => "Tiempo de Descarga Agotado",
            Self::RateLimited => "Limite de Solicitudes",
            Self::Network => "Error de Red",
            Self::InvalidUrl => "URL Invalida",
            Self::Other => "Error de Descarga",
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// True if `code` appears as a standalone number in `text`.
fn has_code(text: &str, code: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit()).any(|t| t == code)
}

/// Status for a descriptor whose download failed.
pub fn fetch_failure_status(detail: Option<&str>) -> String {
    let kind = detail
        .map(FetchErrorKind::from_detail)
        .unwrap_or(FetchErrorKind::Other);
    manual_review(kind.label())
}

/// Status for a document whose text could not be extracted.
pub fn extraction_failure_status(error: &ExtractionError) -> String {
    manual_review(error.category())
}
