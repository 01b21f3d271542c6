//! External tool checks.

use console::style;

use crate::config::Settings;
use crate::ocr::LocalTextExtractor;

/// Show which text extraction tools are installed.
pub async fn cmd_tools(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Text Extraction Tools").bold());
    println!("{}", "-".repeat(50));

    let tools = LocalTextExtractor::check_tools();
    let mut all_found = true;

    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n  {:<15} {}", "language", settings.tesseract_lang);
    println!(
        "  {:<15} {}s",
        "timeout",
        settings.extraction_timeout.as_secs()
    );

    if !all_found {
        println!(
            "\n{}",
            style("Missing tools: install poppler-utils and tesseract-ocr").yellow()
        );
    }

    Ok(())
}
