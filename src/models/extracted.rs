//! Structured fields pulled from the TyT exam-result document.

use serde::{Deserialize, Serialize};

use super::output::status;

/// The five TyT fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TytField {
    IdentityNumber,
    RegistrationCode,
    Institution,
    Program,
    PresentationDate,
}

impl TytField {
    pub const ALL: [TytField; 5] = [
        Self::IdentityNumber,
        Self::RegistrationCode,
        Self::Institution,
        Self::Program,
        Self::PresentationDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityNumber => "identity_number",
            Self::RegistrationCode => "registration_code",
            Self::Institution => "institution",
            Self::Program => "program",
            Self::PresentationDate => "presentation_date",
        }
    }
}

/// Values extracted from a TyT document.
///
/// A field that no pattern could fill holds [`status::MANUAL_EXTRACTION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub identity_number: String,
    pub registration_code: String,
    pub institution: String,
    pub program: String,
    pub presentation_date: String,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            identity_number: status::MANUAL_EXTRACTION.to_string(),
            registration_code: status::MANUAL_EXTRACTION.to_string(),
            institution: status::MANUAL_EXTRACTION.to_string(),
            program: status::MANUAL_EXTRACTION.to_string(),
            presentation_date: status::MANUAL_EXTRACTION.to_string(),
        }
    }
}

impl ExtractedFields {
    pub fn get(&self, field: TytField) -> &str {
        match field {
            TytField::IdentityNumber => &self.identity_number,
            TytField::RegistrationCode => &self.registration_code,
            TytField::Institution => &self.institution,
            TytField::Program => &self.program,
            TytField::PresentationDate => &self.presentation_date,
        }
    }

    pub fn set(&mut self, field: TytField, value: String) {
        match field {
            TytField::IdentityNumber => self.identity_number = value,
            TytField::RegistrationCode => self.registration_code = value,
            TytField::Institution => self.institution = value,
            TytField::Program => self.program = value,
            TytField::PresentationDate => self.presentation_date = value,
        }
    }

    /// Whether `field` was filled by a pattern rather than left for manual review.
    pub fn is_extracted(&self, field: TytField) -> bool {
        self.get(field) != status::MANUAL_EXTRACTION
    }
}
