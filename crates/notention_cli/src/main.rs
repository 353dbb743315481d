//! Command-line probe over `notention_core`.
//!
//! # Responsibility
//! - Run the markup bridge, semantics extraction, matcher and search filter
//!   against files for quick local checks.
//! - Print deterministic JSON (or markup) to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use notention_core::markup::legacy::widgetize_legacy;
use notention_core::{
    filter_notes, init_logging, note_semantics, parse_markup, semantics_from_markup,
    serialize_model, ContentModel, CoreConfig, Note, Property,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "notention")]
#[command(about = "Probe the Notention editing core")]
#[command(version = notention_core::core_version())]
struct Cli {
    /// JSON config file; built-in defaults otherwise
    #[arg(long, env = "NOTENTION_CONFIG")]
    config: Option<PathBuf>,

    /// Absolute directory for log files (overrides the config)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a markup file into the content model
    Parse {
        file: PathBuf,

        /// Convert legacy `[key:value]` and `#tag` text into widgets
        #[arg(long)]
        legacy: bool,
    },

    /// Serialize a content model JSON file back to markup
    Render { file: PathBuf },

    /// Print the tags and properties of a markup file
    Semantics { file: PathBuf },

    /// Check whether a source note satisfies a query note
    Match {
        /// Markup file holding the query properties
        #[arg(long)]
        query: PathBuf,

        /// Markup file holding the candidate facts
        #[arg(long)]
        source: PathBuf,
    },

    /// Filter a JSON array of notes with a search term
    Search {
        notes: PathBuf,

        /// Terms, `"phrases"`, `#tag` and `key:value`
        term: String,
    },
}

#[derive(Serialize)]
struct MatchReport {
    matches: bool,
    query: Vec<Property>,
    source: Vec<Property>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CoreConfig::from_path(path)?,
        None => CoreConfig::default(),
    };
    if let Some(log_dir) = cli.log_dir.as_ref().or(config.log_dir.as_ref()) {
        init_logging(&config.log_level, log_dir).context("failed to start logging")?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        notention_core::core_version()
    );

    match cli.command {
        Commands::Parse { file, legacy } => {
            let mut doc = parse_markup(&read(&file)?);
            if legacy {
                doc = widgetize_legacy(doc);
            }
            print_json(&doc)
        }
        Commands::Render { file } => {
            let doc: ContentModel = serde_json::from_str(&read(&file)?)
                .with_context(|| format!("`{}` is not a content model", file.display()))?;
            println!("{}", serialize_model(&doc));
            Ok(())
        }
        Commands::Semantics { file } => print_json(&semantics_from_markup(&read(&file)?)),
        Commands::Match { query, source } => {
            let query = note_properties(&read(&query)?);
            let source = note_properties(&read(&source)?);
            let matches = config.matcher().matches(&query, &source);
            print_json(&MatchReport {
                matches,
                query,
                source,
            })
        }
        Commands::Search { notes, term } => {
            let notes: Vec<Note> = serde_json::from_str(&read(&notes)?)
                .with_context(|| format!("`{}` is not a JSON array of notes", notes.display()))?;
            print_json(&filter_notes(&notes, &term))
        }
    }
}

/// Properties of a note body, upgrading legacy `[key:value]` text first.
fn note_properties(markup: &str) -> Vec<Property> {
    note_semantics(&widgetize_legacy(parse_markup(markup))).properties
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read `{}`", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
