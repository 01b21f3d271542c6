//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod dict;
mod inspect;
mod process;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "gradcheck")]
#[command(about = "Graduation request document validation and TyT field extraction")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Dictionary directory (overrides config file and environment)
    #[arg(long, global = true)]
    dictionaries: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Process a graduation request and print the output record as JSON
    Process {
        /// Request fields (JSON object)
        request: PathBuf,
        /// Download descriptors (JSON array)
        descriptors: PathBuf,
        /// Document type to URL map (JSON object); derived from the request when omitted
        #[arg(short, long)]
        urls: Option<PathBuf>,
        /// Print timing and diagnostics along with the record
        #[arg(short, long)]
        summary: bool,
        /// Show per-document progress on stderr
        #[arg(short = 'P', long)]
        progress: bool,
        /// Override the per-tier timeout in seconds
        #[arg(long)]
        tier_timeout: Option<u64>,
    },

    /// Validate a text file against a document type's dictionary
    Validate {
        /// Document type (cedula, prueba_tt, ...) or cun_institutions
        doc_type: String,
        /// Text file (already extracted), or a document when --extract is set
        file: PathBuf,
        /// Minimum number of keywords that must match
        #[arg(short, long, default_value = "1")]
        min_matches: usize,
        /// Run text extraction on the file first
        #[arg(short, long)]
        extract: bool,
        /// Print the match result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the TyT fields from a text file
    Extract {
        /// Text file (already extracted), or a document when --document is set
        file: PathBuf,
        /// Run text extraction on the file first
        #[arg(short, long)]
        document: bool,
        /// Print the fields and winning patterns as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect keyword dictionaries
    Dict {
        #[command(subcommand)]
        command: DictCommands,
    },

    /// Check if the external text extraction tools are installed
    Tools,
}

#[derive(Subcommand)]
enum DictCommands {
    /// Load every dictionary and show where its words came from
    Stats,
    /// Print the effective keywords of one dictionary
    Show {
        /// Dictionary name (cedula, prueba_tt, cun_institutions, ...)
        key: String,
    },
    /// Report how many raw entries of a dictionary file survive sanitizing
    Check {
        /// Dictionary name (cedula, prueba_tt, cun_institutions, ...)
        key: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (mut settings, _config) = load_settings_with_options(options).await?;

    if let Some(dir) = cli.dictionaries {
        settings.dictionary_dir = dir;
    }

    match cli.command {
        Commands::Process {
            request,
            descriptors,
            urls,
            summary,
            progress,
            tier_timeout,
        } => {
            if let Some(secs) = tier_timeout.filter(|s| *s > 0) {
                settings.tier_timeout = std::time::Duration::from_secs(secs);
            }
            process::cmd_process(
                &settings,
                &request,
                &descriptors,
                urls.as_deref(),
                summary,
                progress,
            )
            .await
        }
        Commands::Validate {
            doc_type,
            file,
            min_matches,
            extract,
            json,
        } => inspect::cmd_validate(&settings, &doc_type, &file, min_matches, extract, json).await,
        Commands::Extract {
            file,
            document,
            json,
        } => inspect::cmd_extract(&settings, &file, document, json).await,
        Commands::Dict { command } => match command {
            DictCommands::Stats => dict::cmd_dict_stats(&settings).await,
            DictCommands::Show { key } => dict::cmd_dict_show(&settings, &key).await,
            DictCommands::Check { key } => dict::cmd_dict_check(&settings, &key).await,
        },
        Commands::Tools => tools::cmd_tools(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "gradcheck",
            "-v",
            "process",
            "request.json",
            "descriptors.json",
            "--tier-timeout",
            "10",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Process {
                urls, tier_timeout, ..
            } => {
                assert!(urls.is_none());
                assert_eq!(tier_timeout, Some(10));
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_parse_dict_show() {
        let cli = Cli::try_parse_from(["gradcheck", "dict", "show", "prueba_tt"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Dict {
                command: DictCommands::Show { .. }
            }
        ));
    }
}
