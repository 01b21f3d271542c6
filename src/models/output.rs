//! The per-request output record and the patches document tasks produce.
//!
//! The record has a fixed schema of 27 named fields. Every field is present
//! from construction onward; tasks never write the record directly but return
//! a [`DocumentOutcome`] that the orchestrator merges, so each field has
//! exactly one writer.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::DocumentType;
use super::extracted::ExtractedFields;
use super::request::{keys, RequestFields};

/// Closed vocabulary of status values written to the record.
pub mod status {
    pub const NOT_ATTACHED: &str = "Document not attached";
    pub const VALID_DOCUMENT: &str = "Documento Valido";
    pub const MANUAL_REVIEW: &str = "Revision Manual";
    pub const MANUAL_EXTRACTION: &str = "Extraccion Manual";
    pub const VALID: &str = "Valido";
    pub const NOT_APPLICABLE: &str = "N/A";
    pub const STRUCTURE_ERROR: &str = "Error de Estructura";

    /// `"<reason> - Revision Manual"`.
    pub fn manual_review(reason: &str) -> String {
        format!("{} - {}", reason, MANUAL_REVIEW)
    }
}

/// Which part of the pipeline owns a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// Copied from the request.
    Passthrough,
    /// One per document type.
    DocumentStatus,
    /// Written by the TyT task from the field extractor.
    Extracted,
    /// Written by the TyT task from the cross-checks.
    CrossCheck,
}

/// Every field of the output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputField {
    Id,
    NombreCompleto,
    TipoDocumento,
    NumeroDocumento,
    Modalidad,
    NivelFormacion,
    ProgramaSolicitado,
    CorreoInstitucional,
    CorreoPersonal,
    FotocopiaDocumento,
    DiplomaBachiller,
    DiplomaTecnico,
    DiplomaTecnologo,
    DiplomaPregrado,
    ResultadoSaberPro,
    ExamenIcfes,
    ReciboPago,
    EncuestaM0,
    ActaHomologacion,
    RegistroEk,
    AutorizacionDatos,
    NumDocumentoExtraido,
    InstitucionExtraida,
    ProgramaExtraido,
    FechaPresentacionExtraida,
    InstitucionValida,
    NumDocValido,
}

impl OutputField {
    /// All fields in output order.
    pub const ALL: [OutputField; 27] = [
        Self::Id,
        Self::NombreCompleto,
        Self::TipoDocumento,
        Self::NumeroDocumento,
        Self::Modalidad,
        Self::NivelFormacion,
        Self::ProgramaSolicitado,
        Self::CorreoInstitucional,
        Self::CorreoPersonal,
        Self::FotocopiaDocumento,
        Self::DiplomaBachiller,
        Self::DiplomaTecnico,
        Self::DiplomaTecnologo,
        Self::DiplomaPregrado,
        Self::ResultadoSaberPro,
        Self::ExamenIcfes,
        Self::ReciboPago,
        Self::EncuestaM0,
        Self::ActaHomologacion,
        Self::RegistroEk,
        Self::AutorizacionDatos,
        Self::NumDocumentoExtraido,
        Self::InstitucionExtraida,
        Self::ProgramaExtraido,
        Self::FechaPresentacionExtraida,
        Self::InstitucionValida,
        Self::NumDocValido,
    ];

    /// JSON key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::NombreCompleto => "NombreCompleto",
            Self::TipoDocumento => "TipoDocumento",
            Self::NumeroDocumento => "NumeroDocumento",
            Self::Modalidad => "Modalidad",
            Self::NivelFormacion => "NivelDeFormacionSolicitadoParaGrado",
            Self::ProgramaSolicitado => "ProgramaDelCualSolicita",
            // Misspelling is part of the downstream contract.
            Self::CorreoInstitucional => "CorreoInsitucional",
            Self::CorreoPersonal => "CorreoPersonal",
            Self::FotocopiaDocumento => "FotocopiaDocumento",
            Self::DiplomaBachiller => "DiplomayActaGradoBachiller",
            Self::DiplomaTecnico => "DiplomayActaGradoTecnico",
            Self::DiplomaTecnologo => "DiplomayActaGradoTecnologo",
            Self::DiplomaPregrado => "DiplomayActaGradoPregrado",
            Self::ResultadoSaberPro => "ResultadoSaberProDelNivelParaGrado",
            Self::ExamenIcfes => "ExamenIcfes_11",
            Self::ReciboPago => "RecibiDePagoDerechosDeGrado",
            Self::EncuestaM0 => "Encuesta_M0",
            Self::ActaHomologacion => "Acta_Homologacion",
            Self::RegistroEk => "EK",
            Self::AutorizacionDatos => "Autorizacion_tratamiento_de_datos",
            Self::NumDocumentoExtraido => "Num_Documento_Extraido",
            Self::InstitucionExtraida => "Institucion_Extraida",
            Self::ProgramaExtraido => "Programa_Extraido",
            Self::FechaPresentacionExtraida => "Fecha_Presentacion_Extraida",
            Self::InstitucionValida => "Institucion_Valida",
            Self::NumDocValido => "Num_Doc_Valido",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    pub fn group(&self) -> FieldGroup {
        match self {
            Self::Id
            | Self::NombreCompleto
            | Self::TipoDocumento
            | Self::NumeroDocumento
            | Self::Modalidad
            | Self::NivelFormacion
            | Self::ProgramaSolicitado
            | Self::CorreoInstitucional
            | Self::CorreoPersonal
            | Self::AutorizacionDatos => FieldGroup::Passthrough,
            Self::FotocopiaDocumento
            | Self::DiplomaBachiller
            | Self::DiplomaTecnico
            | Self::DiplomaTecnologo
            | Self::DiplomaPregrado
            | Self::ResultadoSaberPro
            | Self::ExamenIcfes
            | Self::ReciboPago
            | Self::EncuestaM0
            | Self::ActaHomologacion => FieldGroup::DocumentStatus,
            Self::RegistroEk
            | Self::NumDocumentoExtraido
            | Self::InstitucionExtraida
            | Self::ProgramaExtraido
            | Self::FechaPresentacionExtraida => FieldGroup::Extracted,
            Self::InstitucionValida | Self::NumDocValido => FieldGroup::CrossCheck,
        }
    }

    /// Request key a passthrough field is copied from.
    pub fn request_key(&self) -> Option<&'static str> {
        match self {
            Self::Id => Some(keys::ID),
            Self::NombreCompleto => Some(keys::FULL_NAME),
            Self::TipoDocumento => Some(keys::ID_TYPE),
            Self::NumeroDocumento => Some(keys::ID_NUMBER),
            Self::Modalidad => Some(keys::MODALITY),
            Self::NivelFormacion => Some(keys::LEVEL),
            Self::ProgramaSolicitado => Some(keys::PROGRAM),
            Self::CorreoInstitucional => Some(keys::INSTITUTIONAL_EMAIL),
            Self::CorreoPersonal => Some(keys::PERSONAL_EMAIL),
            Self::AutorizacionDatos => Some(keys::DATA_CONSENT),
            _ => None,
        }
    }
}

/// Result of a cross-check between extracted and submitted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossCheck {
    Valid,
    ManualReview,
}

impl CrossCheck {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Valid
        } else {
            Self::ManualReview
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => status::VALID,
            Self::ManualReview => status::MANUAL_REVIEW,
        }
    }
}

/// Extra values owned by the TyT task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TytOutcome {
    pub fields: ExtractedFields,
    pub identity_check: CrossCheck,
    pub institution_check: CrossCheck,
}

/// Patch produced by one document task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    doc_type: DocumentType,
    status: String,
    tyt: Option<TytOutcome>,
}

impl DocumentOutcome {
    /// Status-only outcome.
    pub fn status(doc_type: DocumentType, status: impl Into<String>) -> Self {
        Self {
            doc_type,
            status: status.into(),
            tyt: None,
        }
    }

    /// Outcome of a validated TyT document, carrying its extracted fields.
    pub fn tyt(status: impl Into<String>, tyt: TytOutcome) -> Self {
        Self {
            doc_type: DocumentType::PruebaTt,
            status: status.into(),
            tyt: Some(tyt),
        }
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn status_value(&self) -> &str {
        &self.status
    }

    pub fn tyt_outcome(&self) -> Option<&TytOutcome> {
        self.tyt.as_ref()
    }
}

/// The per-request output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    values: BTreeMap<OutputField, String>,
}

impl OutputRecord {
    /// A fresh record: passthrough values copied, documents "not attached",
    /// derived fields "N/A".
    pub fn new(request: &RequestFields) -> Self {
        let values = OutputField::ALL
            .iter()
            .map(|&field| {
                let value = match field.group() {
                    FieldGroup::Passthrough => passthrough_value(request, field),
                    FieldGroup::DocumentStatus => status::NOT_ATTACHED.to_string(),
                    FieldGroup::Extracted | FieldGroup::CrossCheck => {
                        status::NOT_APPLICABLE.to_string()
                    }
                };
                (field, value)
            })
            .collect();

        Self { values }
    }

    /// Record returned when processing failed outright: every document needs
    /// manual review, nothing is extracted.
    pub fn emergency(request: &RequestFields) -> Self {
        let values = OutputField::ALL
            .iter()
            .map(|&field| {
                let value = match field.group() {
                    FieldGroup::Passthrough => passthrough_value(request, field),
                    FieldGroup::DocumentStatus | FieldGroup::CrossCheck => {
                        status::MANUAL_REVIEW.to_string()
                    }
                    FieldGroup::Extracted => status::MANUAL_EXTRACTION.to_string(),
                };
                (field, value)
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, field: OutputField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Status value of a document type.
    pub fn status_of(&self, doc_type: DocumentType) -> Option<&str> {
        self.get(doc_type.status_field())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate present fields in output order.
    pub fn iter(&self) -> impl Iterator<Item = (OutputField, &str)> + '_ {
        OutputField::ALL
            .iter()
            .filter_map(move |&f| self.get(f).map(|v| (f, v)))
    }

    /// Merge a document task's patch. Only the fields owned by that task are
    /// written.
    pub fn apply(&mut self, outcome: &DocumentOutcome) {
        self.values
            .insert(outcome.doc_type.status_field(), outcome.status.clone());

        if let Some(tyt) = &outcome.tyt {
            let f = &tyt.fields;
            self.values
                .insert(OutputField::NumDocumentoExtraido, f.identity_number.clone());
            self.values
                .insert(OutputField::RegistroEk, f.registration_code.clone());
            self.values
                .insert(OutputField::InstitucionExtraida, f.institution.clone());
            self.values
                .insert(OutputField::ProgramaExtraido, f.program.clone());
            self.values.insert(
                OutputField::FechaPresentacionExtraida,
                f.presentation_date.clone(),
            );
            self.values.insert(
                OutputField::NumDocValido,
                tyt.identity_check.as_str().to_string(),
            );
            self.values.insert(
                OutputField::InstitucionValida,
                tyt.institution_check.as_str().to_string(),
            );
        }
    }

    /// Fields that are missing, or blank where a value is always expected.
    ///
    /// Passthrough fields may legitimately be empty strings.
    pub fn integrity_violations(&self) -> Vec<OutputField> {
        OutputField::ALL
            .iter()
            .copied()
            .filter(|&field| match self.values.get(&field) {
                None => true,
                Some(v) => field.group() != FieldGroup::Passthrough && v.trim().is_empty(),
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.integrity_violations().is_empty()
    }

    /// Fill every violating field with the structure-error sentinel, leaving
    /// valid values untouched. Returns the repaired fields.
    pub fn repair(&mut self) -> Vec<OutputField> {
        let broken = self.integrity_violations();
        let sentinel = status::manual_review(status::STRUCTURE_ERROR);
        for field in &broken {
            self.values.insert(*field, sentinel.clone());
        }
        broken
    }
}

fn passthrough_value(request: &RequestFields, field: OutputField) -> String {
    field
        .request_key()
        .map(|key| request.text(key))
        .unwrap_or_default()
}

impl Serialize for OutputField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

/// Reads a possibly partial record (e.g. one stored by an older run).
/// Unknown keys are ignored; null values count as missing so that
/// [`OutputRecord::repair`] can fill them.
impl<'de> Deserialize<'de> for OutputRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let field = OutputField::from_key(&key)?;
                let value = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((field, value))
            })
            .collect();
        Ok(Self { values })
    }
}
