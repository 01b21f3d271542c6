//! Dictionary diagnostics.

use console::style;

use crate::cli::helpers::{failure, parse_dictionary_key, success, warning};
use crate::config::Settings;
use crate::dictionary::{DictionaryRepository, DictionarySource};

/// Load every dictionary and print where each one came from.
pub async fn cmd_dict_stats(settings: &Settings) -> anyhow::Result<()> {
    let repo = settings.dictionary_repository();
    let from_files = repo.preload();
    let stats = repo.stats();

    println!("\n{}", style("Dictionaries").bold());
    println!("  {:<12} {}", "directory", repo.dir().display());
    println!("{}", "-".repeat(70));

    for stat in &stats.details {
        let source = match stat.source {
            Some(DictionarySource::File) => style("file").green(),
            Some(DictionarySource::Merged) => style("merged").yellow(),
            Some(DictionarySource::Fallback) => style("fallback").red(),
            None => style("-").dim(),
        };
        println!(
            "  {:<20} {:>5} words  {:<9} {}",
            stat.key.as_str(),
            stat.word_count,
            source,
            style(stat.file_name).dim()
        );
    }

    println!("{}", "-".repeat(70));
    println!(
        "  {} of {} loaded from files, {} words cached",
        from_files, stats.total_types, stats.total_cached_words
    );

    Ok(())
}

/// Print the effective keywords of a dictionary.
pub async fn cmd_dict_show(settings: &Settings, key: &str) -> anyhow::Result<()> {
    let key = parse_dictionary_key(key)?;
    let set = settings.dictionary_repository().get(key);

    eprintln!(
        "{} {} words ({})",
        style(key.as_str()).bold(),
        set.len(),
        set.source.as_str()
    );
    for keyword in &set.keywords {
        println!("{}", keyword);
    }

    Ok(())
}

/// Report how much of a dictionary file survives sanitizing.
pub async fn cmd_dict_check(settings: &Settings, key: &str) -> anyhow::Result<()> {
    let key = parse_dictionary_key(key)?;
    let repo = settings.dictionary_repository();

    let entries = match repo.raw_entries(key) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("{} {}", failure(), e);
            eprintln!(
                "  {} Built-in words will be used for {}",
                style("→").dim(),
                key.as_str()
            );
            return Ok(());
        }
    };

    let report = DictionaryRepository::check_integrity(&entries, key.file_name());
    let icon = if !report.is_valid() {
        failure()
    } else if report.valid_percentage < 80.0 {
        warning()
    } else {
        success()
    };

    println!(
        "{} {}: {} of {} entries usable ({:.1}%)",
        icon,
        report.name,
        report.valid_entries,
        report.total_entries,
        report.valid_percentage
    );
    if report.invalid_entries > 0 {
        println!(
            "  {} {} entries are too short, too long or lack letters and digits",
            style("→").dim(),
            report.invalid_entries
        );
    }

    Ok(())
}
