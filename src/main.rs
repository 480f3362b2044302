//! # Polity Linker CLI (`polity`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `polity search "<concept>"` | List chapters and lines mentioning a concept |
//! | `polity notes "<concept>"` | Search, then synthesize a linked study note |
//! | `polity render <file>` | Render note text to PDF |
//! | `polity serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Search the bundled corpus
//! polity search "President" --config ./config/polity.toml
//!
//! # Search an uploaded corpus instead
//! polity search "CAG" --corpus ./my-notes.txt
//!
//! # Notes with PDF export (key from $GEMINI_API_KEY)
//! polity notes "Money Bill" --pdf ./out/money_bill.pdf
//! ```

use clap::{Parser, Subcommand};
use polity_linker::progress::ProgressMode;
use polity_linker::{config, export, notes_cmd, search, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Polity Linker: find a concept across textbook chapters and turn it into
/// study notes.
#[derive(Parser)]
#[command(
    name = "polity",
    about = "Polity Linker: link a constitutional concept across textbook chapters",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/polity.toml`. When the file does not exist,
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/polity.toml")]
    config: PathBuf,

    /// Progress output on stderr: `off`, `human`, or `json`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find chapters mentioning a concept.
    ///
    /// Matching is case-insensitive and literal: punctuation in the query is
    /// matched as typed.
    Search {
        /// The concept to look for.
        query: String,

        /// Search this file instead of the configured corpus.
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output format: `text` or `json`.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Search, then synthesize a study note from the matching chapters.
    Notes {
        /// The concept to synthesize notes for.
        query: String,

        /// Search this file instead of the configured corpus.
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// API key for this run. Falls back to the variable named by
        /// `[notes].api_key_env`.
        #[arg(long)]
        api_key: Option<String>,

        /// Also write the note as a PDF to this path.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Render Markdown-like note text to a PDF.
    Render {
        /// Input text file, or `-` for stdin.
        input: PathBuf,

        /// Title printed at the top. Defaults to the input file stem.
        #[arg(long)]
        title: Option<String>,

        /// Output path. Defaults to `<title>_notes.pdf`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polity_linker=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config not found, using defaults");
        config::Config::minimal()
    };

    let progress_mode = match cli.progress.as_deref() {
        Some(s) => ProgressMode::parse(s).ok_or_else(|| {
            anyhow::anyhow!("Unknown progress mode: {}. Use off, human, or json.", s)
        })?,
        None => ProgressMode::default_for_tty(),
    };
    let progress = progress_mode.reporter();

    match cli.command {
        Commands::Search {
            query,
            corpus,
            format,
        } => {
            search::run_search(&cfg, &query, corpus, &format, progress.as_ref())?;
        }
        Commands::Notes {
            query,
            corpus,
            api_key,
            pdf,
        } => {
            notes_cmd::run_notes(&cfg, &query, corpus, api_key, pdf, progress.as_ref()).await?;
        }
        Commands::Render {
            input,
            title,
            output,
        } => {
            export::run_render(&cfg.render, &input, title, output, progress.as_ref())?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
