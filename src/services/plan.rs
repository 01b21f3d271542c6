//! Processing order of document types.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::models::DocumentType;

/// Default time budget of one tier.
pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(30);

/// Document types processed concurrently under one deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityTier {
    pub types: Vec<DocumentType>,
    pub timeout: Duration,
}

/// Ordered tiers. Tiers run one after another; a type appears in at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityPlan {
    tiers: Vec<PriorityTier>,
}

impl Default for PriorityPlan {
    fn default() -> Self {
        Self::standard(DEFAULT_TIER_TIMEOUT)
    }
}

impl PriorityPlan {
    /// Identity first, then academic records, then administrative documents.
    pub fn standard(timeout: Duration) -> Self {
        use DocumentType::*;

        Self::new(
            [
                vec![Cedula],
                vec![
                    DiplomaBachiller,
                    DiplomaTecnico,
                    DiplomaTecnologo,
                    TituloProfesional,
                    PruebaTt,
                    Icfes,
                ],
                vec![ReciboPago, EncuestaM0, ActaHomologacion],
            ]
            .into_iter()
            .map(|types| PriorityTier { types, timeout })
            .collect(),
        )
    }

    /// Build a plan from explicit tiers. A type listed twice stays in its
    /// first tier; empty tiers are dropped.
    pub fn new(tiers: Vec<PriorityTier>) -> Self {
        let mut seen = HashSet::new();
        let tiers = tiers
            .into_iter()
            .map(|tier| PriorityTier {
                types: tier
                    .types
                    .into_iter()
                    .filter(|t| {
                        let first = seen.insert(*t);
                        if !first {
                            tracing::warn!(doc_type = %t, "Document type listed in more than one tier");
                        }
                        first
                    })
                    .collect(),
                timeout: tier.timeout,
            })
            .filter(|tier| !tier.types.is_empty())
            .collect();

        Self { tiers }
    }

    pub fn tiers(&self) -> &[PriorityTier] {
        &self.tiers
    }

    /// Types no tier covers; their fields stay "not attached".
    pub fn uncovered(&self) -> Vec<DocumentType> {
        DocumentType::ALL
            .iter()
            .copied()
            .filter(|t| !self.tiers.iter().any(|tier| tier.types.contains(t)))
            .collect()
    }
}
