use regex::Regex;
use serde::{Deserialize, Serialize};

use super::patterns::CatalogEntry;
use crate::utils::accent_tolerant_pattern;

/// Known institution and program names.
///
/// When configured, a catalog hit wins over the label-based patterns and
/// yields the catalog's spelling instead of the OCR'd one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramCatalog {
    pub institutions: Vec<String>,
    pub programs: Vec<String>,
}

impl ProgramCatalog {
    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty() && self.programs.is_empty()
    }

    pub(super) fn institution_entries(&self) -> Vec<CatalogEntry> {
        compile(&self.institutions)
    }

    pub(super) fn program_entries(&self) -> Vec<CatalogEntry> {
        compile(&self.programs)
    }
}

/// Build accent-tolerant patterns, longest name first so that a program
/// never shadows a longer one that contains it.
fn compile(names: &[String]) -> Vec<CatalogEntry> {
    let mut names: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| {
            let pattern = format!(r"(?i)\b{}\b", accent_tolerant_pattern(name));
            match Regex::new(&pattern) {
                Ok(pattern) => Some(CatalogEntry {
                    pattern,
                    canonical: name.to_string(),
                }),
                Err(e) => {
                    tracing::warn!("Skipping catalog entry {:?}: {}", name, e);
                    None
                }
            }
        })
        .collect()
}
