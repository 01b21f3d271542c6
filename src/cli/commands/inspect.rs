//! Single-document matching and extraction commands.

use std::path::Path;

use console::style;

use crate::cli::helpers::{failure, parse_dictionary_key, read_text, success, truncate};
use crate::config::Settings;
use crate::dictionary::DictionaryKey;
use crate::models::{DocumentType, TytField};
use crate::ocr::TextExtractionService;

/// Load text from `file`, running extraction first when `extract` is set.
async fn load_text(
    settings: &Settings,
    file: &Path,
    doc_type: DocumentType,
    extract: bool,
) -> anyhow::Result<String> {
    if extract {
        let text = settings.text_extractor().extract(file, doc_type).await?;
        Ok(text)
    } else {
        read_text(file).await
    }
}

/// Validate a text against a dictionary.
pub async fn cmd_validate(
    settings: &Settings,
    key: &str,
    file: &Path,
    min_matches: usize,
    extract: bool,
    json: bool,
) -> anyhow::Result<()> {
    let key = parse_dictionary_key(key)?;
    let doc_type = match key {
        DictionaryKey::Document(t) => t,
        // Institution names come from TyT results
        DictionaryKey::Institutions => DocumentType::PruebaTt,
    };

    let text = load_text(settings, file, doc_type, extract).await?;
    let repo = settings.dictionary_repository();
    let dictionary = repo.get(key);
    let result = settings
        .matcher()
        .evaluate(&text, &dictionary.keywords, min_matches);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let verdict = if result.is_valid {
        format!("{} valid", success())
    } else {
        format!("{} not valid", failure())
    };
    println!(
        "{} {} ({} of {} keywords from {})",
        style(key.as_str()).bold(),
        verdict,
        result.match_count,
        dictionary.len(),
        dictionary.source.as_str()
    );
    println!("  {:<10} {}", "strategy", result.strategy);
    for keyword in &result.matched_keywords {
        println!("  {} {}", style("→").dim(), keyword);
    }

    Ok(())
}

/// Extract the TyT fields of a text.
pub async fn cmd_extract(
    settings: &Settings,
    file: &Path,
    document: bool,
    json: bool,
) -> anyhow::Result<()> {
    let text = load_text(settings, file, DocumentType::PruebaTt, document).await?;
    let report = settings.field_extractor().extract_detailed(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", style("TyT Fields").bold());
    println!("{}", "-".repeat(60));
    for field in TytField::ALL {
        let value = report.fields.get(field);
        let source = match report.winners.get(&field) {
            Some(pattern) => style(format!("[{}]", pattern)).dim(),
            None => style("[no match]".to_string()).red(),
        };
        println!(
            "  {:<20} {} {}",
            field.as_str(),
            truncate(value, 60),
            source
        );
    }

    Ok(())
}
