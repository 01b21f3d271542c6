//! Shared helper functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use console::{style, StyledObject};
use serde::de::DeserializeOwned;

use crate::dictionary::DictionaryKey;

pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn failure() -> StyledObject<&'static str> {
    style("✗").red()
}

pub fn warning() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Read and deserialize a JSON file.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Read a UTF-8 text file.
pub async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse a dictionary key given on the command line (`cedula`, `prueba_tt`,
/// `cun_institutions`, ...).
pub fn parse_dictionary_key(s: &str) -> anyhow::Result<DictionaryKey> {
    DictionaryKey::from_str(s.trim()).ok_or_else(|| {
        let known: Vec<&str> = DictionaryKey::ALL.iter().map(|k| k.as_str()).collect();
        anyhow::anyhow!("Unknown dictionary '{}'. Known: {}", s, known.join(", "))
    })
}

/// Shorten long text for terminal display.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
