use std::collections::HashSet;

use super::fuzzy::{fragment_match, parts_match, token_match, words};
use super::{MatchConfig, MatchResult, MatchStrategy, ValidationError};
use crate::utils::fold_accents;

const MIN_KEYWORD_CHARS: usize = 2;
const MAX_KEYWORD_CHARS: usize = 100;

/// Exact-then-fuzzy keyword matcher. Stateless apart from its thresholds,
/// so one instance can be shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// True if `text` contains at least `min_matches` keywords of `dictionary`
    /// (clamped to the dictionary size).
    pub fn validate<S: AsRef<str>>(&self, text: &str, dictionary: &[S], min_matches: usize) -> bool {
        self.evaluate(text, dictionary, min_matches).is_valid
    }

    /// Like [`validate`](Self::validate) but reports which keywords matched
    /// and how.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        text: &str,
        dictionary: &[S],
        min_matches: usize,
    ) -> MatchResult {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return MatchResult::invalid();
        }

        let keywords = sanitize(dictionary);
        if keywords.is_empty() {
            tracing::debug!("Dictionary empty after sanitation");
            return MatchResult::invalid();
        }
        let effective = min_matches.clamp(1, keywords.len());

        if keywords.len() < self.config.small_dictionary {
            return naive(&normalized, &keywords, effective);
        }

        match self.cascade(&normalized, &keywords, effective) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Falling back to substring matching: {}", e);
                naive(&normalized, &keywords, effective)
            }
        }
    }

    fn cascade(
        &self,
        text: &str,
        keywords: &[String],
        effective: usize,
    ) -> Result<MatchResult, ValidationError> {
        let chars = text.chars().count();
        if chars > self.config.max_text_chars {
            return Err(ValidationError::TextTooLarge {
                chars,
                limit: self.config.max_text_chars,
            });
        }

        let mut matched: Vec<String> = Vec::new();
        let mut matched_set: HashSet<&str> = HashSet::new();

        for keyword in keywords {
            if matched.len() >= effective {
                break;
            }
            if text.contains(keyword.as_str()) {
                tracing::debug!(keyword = %keyword, "Exact match");
                matched.push(keyword.clone());
                matched_set.insert(keyword);
            }
        }
        let exact_count = matched.len();

        if matched.len() < effective {
            let folded_text = fold_accents(text);
            let text_words: Vec<&str> = words(&folded_text).collect();

            for keyword in keywords {
                if matched.len() >= effective {
                    break;
                }
                if matched_set.contains(keyword.as_str()) {
                    continue;
                }
                if let Some(rule) = self.fuzzy_rule(keyword, &folded_text, &text_words) {
                    tracing::debug!(keyword = %keyword, rule, "Fuzzy match");
                    matched.push(keyword.clone());
                    matched_set.insert(keyword);
                }
            }
        }

        let strategy = if matched.is_empty() {
            MatchStrategy::None
        } else if matched.len() == exact_count {
            MatchStrategy::Exact
        } else {
            MatchStrategy::ExactFuzzy
        };

        Ok(MatchResult {
            is_valid: matched.len() >= effective,
            match_count: matched.len(),
            matched_keywords: matched,
            strategy,
        })
    }

    /// Name of the first fuzzy rule accepting `keyword`, if any.
    fn fuzzy_rule(&self, keyword: &str, folded_text: &str, text_words: &[&str]) -> Option<&'static str> {
        let folded = fold_accents(keyword);
        let long = folded.chars().count() >= self.config.min_fuzzy_len;

        if folded_text.contains(&folded) {
            return Some("accent");
        }
        if long && token_match(&folded, text_words.iter().copied(), self.config.similarity_threshold) {
            return Some("token");
        }
        if folded.contains(' ') && parts_match(&folded, folded_text, self.config.parts_ratio) {
            return Some("parts");
        }
        if long && fragment_match(&folded, folded_text, self.config.substring_ratio) {
            return Some("fragment");
        }
        None
    }
}

/// Trim, lowercase, keep plausible entries and dedupe. Falls back to every
/// non-blank entry when the filter removes everything.
fn sanitize<S: AsRef<str>>(dictionary: &[S]) -> Vec<String> {
    let lowered: Vec<String> = dictionary
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let filtered: Vec<String> = lowered
        .iter()
        .filter(|k| {
            let len = k.chars().count();
            (MIN_KEYWORD_CHARS..=MAX_KEYWORD_CHARS).contains(&len)
                && k.chars().any(char::is_alphanumeric)
        })
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect();

    if !filtered.is_empty() {
        return filtered;
    }

    let mut seen = HashSet::new();
    lowered
        .into_iter()
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Plain substring counting with accents folded on both sides.
fn naive(text: &str, keywords: &[String], effective: usize) -> MatchResult {
    let folded_text = fold_accents(text);
    let matched: Vec<String> = keywords
        .iter()
        .filter(|k| folded_text.contains(&fold_accents(k)))
        .cloned()
        .collect();

    MatchResult {
        is_valid: matched.len() >= effective,
        match_count: matched.len(),
        strategy: if matched.is_empty() {
            MatchStrategy::None
        } else {
            MatchStrategy::Exact
        },
        matched_keywords: matched,
    }
}
