//! Configuration management for gradcheck using the prefer crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::{DictionaryRepository, DEFAULT_MIN_ENTRIES};
use crate::extraction::{FieldExtractor, ProgramCatalog};
use crate::matching::{MatchConfig, Matcher};
use crate::ocr::{LocalTextExtractor, TextExtractionService};
use crate::services::{DocumentOrchestrator, PriorityPlan, DEFAULT_ACCEPTED_HOSTS};

/// Default dictionary directory name, relative to the working directory.
const DICTIONARIES_SUBDIR: &str = "dictionaries";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the keyword dictionaries.
    pub dictionary_dir: PathBuf,
    /// Dictionaries with fewer entries are merged with the built-in words.
    pub min_dictionary_entries: usize,
    /// Keywords a document must contain to be considered valid.
    pub min_matches: usize,
    pub matching: MatchConfig,
    /// Time budget of each processing tier.
    pub tier_timeout: Duration,
    /// Time budget of a single text extraction.
    pub extraction_timeout: Duration,
    pub max_document_bytes: u64,
    pub tesseract_lang: String,
    /// Hosts accepted for document links in request fields.
    pub accepted_hosts: Vec<String>,
    pub catalog: ProgramCatalog,
}

impl Default for Settings {
    fn default() -> Self {
        // Prefer an installed copy under the user data dir, else ./dictionaries
        let installed = dirs::data_dir().map(|d| d.join("gradcheck").join(DICTIONARIES_SUBDIR));
        let dictionary_dir = installed
            .filter(|d| d.is_dir())
            .unwrap_or_else(|| PathBuf::from(DICTIONARIES_SUBDIR));

        Self {
            dictionary_dir,
            min_dictionary_entries: DEFAULT_MIN_ENTRIES,
            min_matches: 1,
            matching: MatchConfig::default(),
            tier_timeout: crate::services::DEFAULT_TIER_TIMEOUT,
            extraction_timeout: Duration::from_secs(120),
            max_document_bytes: 500 * 1024 * 1024,
            tesseract_lang: "spa".to_string(),
            accepted_hosts: DEFAULT_ACCEPTED_HOSTS.iter().map(|h| h.to_string()).collect(),
            catalog: ProgramCatalog::default(),
        }
    }
}

impl Settings {
    pub fn dictionary_repository(&self) -> DictionaryRepository {
        DictionaryRepository::new(&self.dictionary_dir).with_min_entries(self.min_dictionary_entries)
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.matching.clone())
    }

    pub fn field_extractor(&self) -> FieldExtractor {
        if self.catalog.is_empty() {
            FieldExtractor::new()
        } else {
            FieldExtractor::new().with_catalog(&self.catalog)
        }
    }

    pub fn text_extractor(&self) -> LocalTextExtractor {
        LocalTextExtractor::new()
            .with_language(&self.tesseract_lang)
            .with_max_bytes(self.max_document_bytes)
            .with_timeout(self.extraction_timeout)
    }

    /// Orchestrator wired with these settings.
    pub fn orchestrator(&self, extractor: Arc<dyn TextExtractionService>) -> DocumentOrchestrator {
        DocumentOrchestrator::new(extractor, Arc::new(self.dictionary_repository()))
            .with_matcher(self.matcher())
            .with_field_extractor(self.field_extractor())
            .with_min_matches(self.min_matches)
            .with_plan(PriorityPlan::standard(self.tier_timeout))
    }

    /// Apply environment overrides. `lookup` is normally `std::env::var`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        if let Some(dir) = var("GRADCHECK_DICTIONARY_DIR") {
            tracing::debug!("Using GRADCHECK_DICTIONARY_DIR from environment: {}", dir);
            self.dictionary_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }

        if let Some(secs) = var("GRADCHECK_TIER_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.tier_timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid GRADCHECK_TIER_TIMEOUT_SECS: {}", secs),
            }
        }

        if let Some(lang) = var("GRADCHECK_TESSERACT_LANG") {
            self.tesseract_lang = lang;
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dictionary directory, relative to the config file unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_dictionary_entries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_matches: Option<usize>,
    /// Matching thresholds; omitted keys keep their defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_document_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_hosts: Option<Vec<String>>,
    /// Known institution and program names for extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<ProgramCatalog>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers gradcheck config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("gradcheck").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref dir) = self.dictionary_dir {
            settings.dictionary_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(min) = self.min_dictionary_entries {
            settings.min_dictionary_entries = min;
        }
        if let Some(min) = self.min_matches {
            settings.min_matches = min.max(1);
        }
        if let Some(ref matching) = self.matching {
            settings.matching = matching.clone();
        }
        if let Some(secs) = self.tier_timeout_secs.filter(|s| *s > 0) {
            settings.tier_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.extraction_timeout_secs.filter(|s| *s > 0) {
            settings.extraction_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_document_bytes {
            settings.max_document_bytes = max;
        }
        if let Some(ref lang) = self.tesseract_lang {
            settings.tesseract_lang = lang.clone();
        }
        if let Some(ref hosts) = self.accepted_hosts {
            settings.accepted_hosts = hosts.clone();
        }
        if let Some(ref catalog) = self.catalog {
            settings.catalog = catalog.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load settings with explicit options.
///
/// An explicit config path must load; an auto-discovered file that fails to
/// parse is ignored with a warning. Environment variables take precedence
/// over the file.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env_overrides(|name| std::env::var(name).ok());

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Ok((settings, config))
}
