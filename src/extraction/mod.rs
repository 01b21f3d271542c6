//! Structured field extraction from TyT exam-result text.
//!
//! Each field owns an ordered list of named patterns. They are tried by
//! priority and the first candidate that survives post-processing wins; a
//! field nothing matches keeps the manual-extraction sentinel.

mod catalog;
mod patterns;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{ExtractedFields, TytField};

pub use catalog::ProgramCatalog;
pub use patterns::{CatalogEntry, FieldPattern, PatternStrategy};

/// Priority given to catalog patterns so they run before everything else.
const CATALOG_PRIORITY: u8 = 0;

/// Extracted fields plus the name of the pattern that produced each one.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub fields: ExtractedFields,
    pub winners: BTreeMap<TytField, &'static str>,
}

/// Extracts the five TyT fields from OCR'd text.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    families: Vec<(TytField, Vec<FieldPattern>)>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Extractor with the built-in pattern families.
    pub fn new() -> Self {
        Self {
            families: patterns::DEFAULT_PATTERNS.clone(),
        }
    }

    /// Add a closed-vocabulary fast path for institution and program names.
    pub fn with_catalog(mut self, catalog: &ProgramCatalog) -> Self {
        let institutions = catalog.institution_entries();
        if !institutions.is_empty() {
            self.add_pattern(
                TytField::Institution,
                FieldPattern {
                    name: "catalog",
                    priority: CATALOG_PRIORITY,
                    strategy: PatternStrategy::Catalog(institutions),
                },
            );
        }

        let programs = catalog.program_entries();
        if !programs.is_empty() {
            self.add_pattern(
                TytField::Program,
                FieldPattern {
                    name: "catalog",
                    priority: CATALOG_PRIORITY,
                    strategy: PatternStrategy::Catalog(programs),
                },
            );
        }

        self
    }

    /// Insert a pattern into a field's family, keeping priority order.
    /// Equal priorities keep insertion order.
    pub fn add_pattern(&mut self, field: TytField, pattern: FieldPattern) {
        if let Some((_, family)) = self.families.iter_mut().find(|(f, _)| *f == field) {
            let at = family.partition_point(|p| p.priority <= pattern.priority);
            family.insert(at, pattern);
        } else {
            self.families.push((field, vec![pattern]));
        }
    }

    /// Patterns of one field, in evaluation order.
    pub fn patterns(&self, field: TytField) -> &[FieldPattern] {
        self.families
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, p)| p.as_slice())
            .unwrap_or(&[])
    }

    /// Extract all fields. Never fails; misses keep the manual sentinel.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        self.extract_detailed(text).fields
    }

    /// Extract all fields and report the winning pattern per field.
    pub fn extract_detailed(&self, text: &str) -> ExtractionReport {
        let mut fields = ExtractedFields::default();
        let mut winners = BTreeMap::new();

        for field in TytField::ALL {
            match self.extract_field(field, text) {
                Some((name, value)) => {
                    tracing::debug!(field = field.as_str(), pattern = name, "Extracted {}", value);
                    fields.set(field, value);
                    winners.insert(field, name);
                }
                None => {
                    tracing::debug!(field = field.as_str(), "No pattern matched");
                }
            }
        }

        ExtractionReport { fields, winners }
    }

    fn extract_field(&self, field: TytField, text: &str) -> Option<(&'static str, String)> {
        self.patterns(field).iter().find_map(|pattern| {
            let raw = pattern.find(text)?;
            let value = patterns::post_process(field, &raw)?;
            Some((pattern.name, value))
        })
    }
}
