//! Document types and the descriptors produced by the download step.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::output::OutputField;

/// Logical type of a document attached to a graduation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Identity card (cédula de ciudadanía).
    Cedula,
    DiplomaBachiller,
    DiplomaTecnico,
    DiplomaTecnologo,
    TituloProfesional,
    /// Saber TyT exam results. The only type with structured extraction.
    PruebaTt,
    /// Saber 11 (ICFES) exam results.
    Icfes,
    ReciboPago,
    EncuestaM0,
    ActaHomologacion,
}

impl DocumentType {
    /// Every type, in canonical order.
    pub const ALL: [DocumentType; 10] = [
        Self::Cedula,
        Self::DiplomaBachiller,
        Self::DiplomaTecnico,
        Self::DiplomaTecnologo,
        Self::TituloProfesional,
        Self::PruebaTt,
        Self::Icfes,
        Self::ReciboPago,
        Self::EncuestaM0,
        Self::ActaHomologacion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cedula => "cedula",
            Self::DiplomaBachiller => "diploma_bachiller",
            Self::DiplomaTecnico => "diploma_tecnico",
            Self::DiplomaTecnologo => "diploma_tecnologo",
            Self::TituloProfesional => "titulo_profesional",
            Self::PruebaTt => "prueba_tt",
            Self::Icfes => "icfes",
            Self::ReciboPago => "recibo_pago",
            Self::EncuestaM0 => "encuesta_m0",
            Self::ActaHomologacion => "acta_homologacion",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// The status field this type writes in the output record.
    pub fn status_field(&self) -> OutputField {
        match self {
            Self::Cedula => OutputField::FotocopiaDocumento,
            Self::DiplomaBachiller => OutputField::DiplomaBachiller,
            Self::DiplomaTecnico => OutputField::DiplomaTecnico,
            Self::DiplomaTecnologo => OutputField::DiplomaTecnologo,
            Self::TituloProfesional => OutputField::DiplomaPregrado,
            Self::PruebaTt => OutputField::ResultadoSaberPro,
            Self::Icfes => OutputField::ExamenIcfes,
            Self::ReciboPago => OutputField::ReciboPago,
            Self::EncuestaM0 => OutputField::EncuestaM0,
            Self::ActaHomologacion => OutputField::ActaHomologacion,
        }
    }

    /// Whether this is the TyT exam-result type.
    pub fn is_tyt(&self) -> bool {
        matches!(self, Self::PruebaTt)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the upstream download for one URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[default]
    Success,
    Error,
}

/// A downloaded (or failed) attachment, as reported by the fetch step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescriptor {
    /// URL the applicant submitted.
    #[serde(alias = "original_url")]
    pub original_url: String,
    /// Local file, when the download succeeded.
    #[serde(default, alias = "path", alias = "local_path")]
    pub local_path: Option<PathBuf>,
    #[serde(default)]
    pub status: DownloadStatus,
    /// Categorized error message from the fetch step (e.g. `FILE_NOT_FOUND: ...`).
    #[serde(default, alias = "error", alias = "error_detail")]
    pub error_detail: Option<String>,
}

impl DocumentDescriptor {
    /// Descriptor for a successful download.
    pub fn downloaded(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            original_url: url.into(),
            local_path: Some(path.into()),
            status: DownloadStatus::Success,
            error_detail: None,
        }
    }

    /// Descriptor for a failed download.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            original_url: url.into(),
            local_path: None,
            status: DownloadStatus::Error,
            error_detail: Some(error.into()),
        }
    }
}

/// URL submitted by the applicant for each document type.
pub type DocumentUrls = BTreeMap<DocumentType, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trip_names() {
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(t.as_str()), Some(t));
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert_eq!(DocumentType::from_str("pasaporte"), None);
    }

    #[test]
    fn test_status_fields_are_distinct() {
        let mut fields: Vec<_> = DocumentType::ALL.iter().map(|t| t.status_field()).collect();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), DocumentType::ALL.len());
    }

    #[test]
    fn test_descriptor_accepts_original_spellings() {
        let json = r#"{"originalUrl":"https://drive.google.com/x","path":"/tmp/a.pdf","status":"success","error":null}"#;
        let d: DocumentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.local_path, Some(PathBuf::from("/tmp/a.pdf")));
        assert_eq!(d.status, DownloadStatus::Success);

        let json = r#"{"originalUrl":"u","localPath":null,"status":"error","errorDetail":"FILE_NOT_FOUND: gone"}"#;
        let d: DocumentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.status, DownloadStatus::Error);
        assert_eq!(d.error_detail.as_deref(), Some("FILE_NOT_FOUND: gone"));
    }

    #[test]
    fn test_document_urls_keyed_by_type_name() {
        let urls: DocumentUrls =
            serde_json::from_str(r#"{"prueba_tt":"https://drive.google.com/file/d/1"}"#).unwrap();
        assert_eq!(
            urls.get(&DocumentType::PruebaTt).map(String::as_str),
            Some("https://drive.google.com/file/d/1")
        );
    }
}
