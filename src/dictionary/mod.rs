//! Keyword dictionaries per document type.
//!
//! Each document type (plus the secondary institution vocabulary used to
//! cross-check TyT results) has a plain-text dictionary file with one keyword
//! per line. [`DictionaryRepository`] loads, sanitizes and caches them, and
//! substitutes built-in vocabularies when a file is missing or suspiciously
//! small.

mod fallback;
mod repository;

use serde::{Deserialize, Serialize};

use crate::models::DocumentType;

pub use fallback::fallback_words;
pub use repository::{
    DictionaryError, DictionaryRepository, DictionarySet, DictionarySource, DictionaryStat,
    DictionaryStats, IntegrityReport, DEFAULT_MIN_ENTRIES,
};

/// Identifies one dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DictionaryKey {
    /// Vocabulary that identifies a document type.
    Document(DocumentType),
    /// Institution names accepted when cross-checking TyT results.
    Institutions,
}

impl DictionaryKey {
    pub const ALL: [DictionaryKey; 11] = [
        Self::Document(DocumentType::Cedula),
        Self::Document(DocumentType::DiplomaBachiller),
        Self::Document(DocumentType::DiplomaTecnico),
        Self::Document(DocumentType::DiplomaTecnologo),
        Self::Document(DocumentType::TituloProfesional),
        Self::Document(DocumentType::PruebaTt),
        Self::Document(DocumentType::Icfes),
        Self::Document(DocumentType::ReciboPago),
        Self::Document(DocumentType::EncuestaM0),
        Self::Document(DocumentType::ActaHomologacion),
        Self::Institutions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document(t) => t.as_str(),
            Self::Institutions => "cun_institutions",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        if s == "cun_institutions" {
            return Some(Self::Institutions);
        }
        DocumentType::from_str(s).map(Self::Document)
    }

    /// File name of the dictionary inside the dictionary directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Document(doc_type) => match doc_type {
                DocumentType::Cedula => "Diccionario_Documentos_Identidad.txt",
                DocumentType::DiplomaBachiller => "DiccionarioActayDiplomaBachiller.txt",
                DocumentType::DiplomaTecnico => "DiccionarioActayDiplomaTecnico.txt",
                DocumentType::DiplomaTecnologo => "DiccionarioActayDiplomaTecnologo.txt",
                DocumentType::TituloProfesional => "DiccionarioActayDiplomaPregrado.txt",
                DocumentType::PruebaTt => "DiccionarioTYT.txt",
                DocumentType::Icfes => "DiccionarioIcfes.txt",
                DocumentType::ReciboPago => "DiccionarioPagoDerechosDeGrado.txt",
                DocumentType::EncuestaM0 => "DiccionarioEncuestaSeguimiento.txt",
                DocumentType::ActaHomologacion => "DiccionarioActaHomologacion.txt",
            },
            Self::Institutions => "DiccionarioCUN.txt",
        }
    }
}

impl From<DocumentType> for DictionaryKey {
    fn from(doc_type: DocumentType) -> Self {
        Self::Document(doc_type)
    }
}

impl From<DictionaryKey> for String {
    fn from(key: DictionaryKey) -> Self {
        key.as_str().to_string()
    }
}

impl TryFrom<String> for DictionaryKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s).ok_or_else(|| format!("unknown dictionary: {}", s))
    }
}

impl std::fmt::Display for DictionaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
