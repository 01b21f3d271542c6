//! Dictionary-based text matching.
//!
//! Decides whether OCR'd text plausibly belongs to a document type by
//! counting how many keywords of the type's dictionary it contains. Exact
//! substring hits are tried first; remaining keywords go through a fuzzy
//! cascade that tolerates missing accents, OCR typos and partially recognized
//! phrases.

mod fuzzy;
mod matcher;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use matcher::Matcher;

/// Tunable thresholds of the matching cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum positional similarity for a token to count as a typo match.
    pub similarity_threshold: f64,
    /// Share of multi-word keyword parts that must be present.
    pub parts_ratio: f64,
    /// Share of a keyword's length a contiguous fragment must cover.
    pub substring_ratio: f64,
    /// Keywords shorter than this skip the token and fragment rules.
    pub min_fuzzy_len: usize,
    /// Dictionaries with fewer sanitized entries use plain substring counting.
    pub small_dictionary: usize,
    /// Texts longer than this (in chars) skip the cascade.
    pub max_text_chars: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            parts_ratio: 0.6,
            substring_ratio: 0.6,
            min_fuzzy_len: 6,
            small_dictionary: 5,
            max_text_chars: 2_000_000,
        }
    }
}

/// Which passes produced the matches of a [`MatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "exact+fuzzy")]
    ExactFuzzy,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Exact => "exact",
            Self::ExactFuzzy => "exact+fuzzy",
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a text against a dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_valid: bool,
    pub match_count: usize,
    pub matched_keywords: Vec<String>,
    pub strategy: MatchStrategy,
}

impl MatchResult {
    pub(crate) fn invalid() -> Self {
        Self {
            is_valid: false,
            match_count: 0,
            matched_keywords: Vec::new(),
            strategy: MatchStrategy::None,
        }
    }
}

/// Inputs the cascade refuses to process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text has {chars} characters, limit is {limit}")]
    TextTooLarge { chars: usize, limit: usize },
}
