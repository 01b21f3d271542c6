//! Loading and caching of keyword dictionaries.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use thiserror::Error;

use super::{fallback_words, DictionaryKey};

/// A file with fewer usable entries than this is assumed to be broken and is
/// merged with the built-in vocabulary.
pub const DEFAULT_MIN_ENTRIES: usize = 5;

/// Errors reading a dictionary file. Never surfaced by [`DictionaryRepository::get`].
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("dictionary file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dictionary has no usable entries: {0}")]
    Empty(PathBuf),
}

/// Where the keywords of a [`DictionarySet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionarySource {
    File,
    Fallback,
    Merged,
}

impl DictionarySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Fallback => "fallback",
            Self::Merged => "merged",
        }
    }
}

/// Sanitized keywords for one dictionary. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionarySet {
    pub key: DictionaryKey,
    pub keywords: Vec<String>,
    pub source: DictionarySource,
}

impl DictionarySet {
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Per-dictionary line of [`DictionaryStats`].
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryStat {
    pub key: DictionaryKey,
    pub file_name: &'static str,
    pub loaded: bool,
    pub word_count: usize,
    pub source: Option<DictionarySource>,
}

/// Cache health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryStats {
    pub total_types: usize,
    pub loaded_types: usize,
    pub total_cached_words: usize,
    pub details: Vec<DictionaryStat>,
}

/// Result of [`DictionaryRepository::check_integrity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub name: String,
    pub total_entries: usize,
    pub valid_entries: usize,
    pub invalid_entries: usize,
    pub valid_percentage: f64,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.valid_entries > 0
    }
}

/// Supplies keyword lists per dictionary key.
///
/// Sets are built on first use and cached for the lifetime of the repository
/// (or until [`clear`](Self::clear)). Loads are idempotent, so concurrent
/// first calls for the same key may both load; the last insert wins with
/// identical content.
pub struct DictionaryRepository {
    dir: PathBuf,
    min_entries: usize,
    cache: RwLock<HashMap<&'static str, Arc<DictionarySet>>>,
}

impl DictionaryRepository {
    /// Create a repository reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            min_entries: DEFAULT_MIN_ENTRIES,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Set the minimum number of file entries before the fallback is merged in.
    pub fn with_min_entries(mut self, min_entries: usize) -> Self {
        self.min_entries = min_entries;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the dictionary for `key`. Never fails; missing or broken files
    /// degrade to the built-in vocabulary.
    pub fn get(&self, key: impl Into<DictionaryKey>) -> Arc<DictionarySet> {
        let key = key.into();
        let cache_key = key.file_name();

        if let Some(set) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(cache_key)
        {
            return set.clone();
        }

        let set = Arc::new(self.load(key));
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cache_key, set.clone());
        set
    }

    /// Build the set for `key` without touching the cache.
    pub fn load(&self, key: DictionaryKey) -> DictionarySet {
        let path = self.dir.join(key.file_name());

        match read_keywords(&path) {
            Ok(keywords) if keywords.len() >= self.min_entries => {
                tracing::debug!(
                    dictionary = %key,
                    entries = keywords.len(),
                    "Loaded dictionary from {}",
                    path.display()
                );
                DictionarySet {
                    key,
                    keywords,
                    source: DictionarySource::File,
                }
            }
            Ok(keywords) => {
                tracing::warn!(
                    dictionary = %key,
                    entries = keywords.len(),
                    min_entries = self.min_entries,
                    "Dictionary too small, merging with built-in vocabulary"
                );
                let original = keywords.len();
                let keywords = dedupe(keywords.into_iter().chain(fallback_iter(key)));
                tracing::debug!(
                    dictionary = %key,
                    "Merged dictionary: {} -> {} words",
                    original,
                    keywords.len()
                );
                DictionarySet {
                    key,
                    keywords,
                    source: DictionarySource::Merged,
                }
            }
            Err(e) => {
                tracing::warn!(dictionary = %key, "Using built-in vocabulary: {}", e);
                DictionarySet {
                    key,
                    keywords: dedupe(fallback_iter(key)),
                    source: DictionarySource::Fallback,
                }
            }
        }
    }

    /// Load every dictionary into the cache. Returns how many came from disk.
    pub fn preload(&self) -> usize {
        DictionaryKey::ALL
            .iter()
            .filter(|&&key| self.get(key).source == DictionarySource::File)
            .count()
    }

    /// Drop every cached set. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let removed = cache.len();
        cache.clear();
        tracing::info!("Dictionary cache cleared: {} removed", removed);
        removed
    }

    /// Snapshot of what is currently cached.
    pub fn stats(&self) -> DictionaryStats {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());

        let details: Vec<DictionaryStat> = DictionaryKey::ALL
            .iter()
            .map(|&key| {
                let cached = cache.get(key.file_name());
                DictionaryStat {
                    key,
                    file_name: key.file_name(),
                    loaded: cached.is_some(),
                    word_count: cached.map(|s| s.len()).unwrap_or(0),
                    source: cached.map(|s| s.source),
                }
            })
            .collect();

        DictionaryStats {
            total_types: DictionaryKey::ALL.len(),
            loaded_types: details.iter().filter(|d| d.loaded).count(),
            total_cached_words: cache.values().map(|s| s.len()).sum(),
            details,
        }
    }

    /// Count usable entries in a raw word list. Diagnostic only.
    pub fn check_integrity(entries: &[String], name: &str) -> IntegrityReport {
        let total = entries.len();
        let valid = entries.iter().filter(|e| !e.trim().is_empty()).count();
        let valid_percentage = if total == 0 {
            0.0
        } else {
            valid as f64 / total as f64 * 100.0
        };

        if total > 0 && valid_percentage < 80.0 {
            tracing::warn!(
                dictionary = name,
                "Only {:.1}% of entries are usable",
                valid_percentage
            );
        }

        IntegrityReport {
            name: name.to_string(),
            total_entries: total,
            valid_entries: valid,
            invalid_entries: total - valid,
            valid_percentage,
        }
    }

    /// Read the raw (unsanitized) lines of a dictionary file, for diagnostics.
    pub fn raw_entries(&self, key: DictionaryKey) -> Result<Vec<String>, DictionaryError> {
        let path = self.dir.join(key.file_name());
        let content = read_file(&path)?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

fn fallback_iter(key: DictionaryKey) -> impl Iterator<Item = String> {
    fallback_words(key).iter().map(|w| w.to_lowercase())
}

fn read_file(path: &Path) -> Result<String, DictionaryError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DictionaryError::NotFound(path.to_path_buf())
        } else {
            DictionaryError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Read, trim, drop blanks and comments, lowercase and dedupe.
fn read_keywords(path: &Path) -> Result<Vec<String>, DictionaryError> {
    let content = read_file(path)?;

    let keywords = dedupe(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with('#') && !line.starts_with("//"))
            .map(str::to_lowercase),
    );

    if keywords.is_empty() {
        return Err(DictionaryError::Empty(path.to_path_buf()));
    }
    Ok(keywords)
}

/// Remove duplicates, keeping first occurrences in order.
fn dedupe(words: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words.filter(|w| seen.insert(w.clone())).collect()
}
