//! CLI module for docent
//!
//! Command-line parsing for the `docent` binary. Uses clap for argument
//! parsing and owo-colors for terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docent - retrieval-augmented answers over a document library
#[derive(Parser, Debug)]
#[command(
    name = "docent",
    version,
    about = "docent - retrieval-augmented answers over a document library",
    long_about = "Ingests documents from a hosted repository or local uploads into a persistent\n\
                  vector index, then answers questions and runs guided conversations grounded\n\
                  in the retrieved passages.",
    after_help = "EXAMPLES:\n    \
                  docent ingest-repo https://github.com/acme/handbook\n    \
                  docent ingest-upload ./notes/type-4.pdf\n    \
                  docent ask \"What motivates a Type 5?\"\n    \
                  docent chat --session alice \"I'm a Type 2, my partner is a Type 8\"\n    \
                  docent --config my.toml stats"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "docent.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a hosted repository, incrementally when a watermark exists
    IngestRepo {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,

        /// Branch to ingest
        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// Ingest a local file (pdf, docx, txt, md, html), one document per page
    IngestUpload {
        /// File to upload
        file: PathBuf,
    },

    /// Answer a single question from the library
    Ask {
        /// The question
        query: String,

        /// Number of passages to retrieve
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Send one message in a persisted guided conversation
    Chat {
        /// Session identifier
        #[arg(short, long)]
        session: String,

        /// Conversation profile (relationships or personality)
        #[arg(short, long, default_value = "relationships")]
        profile: String,

        /// The message to send
        message: String,
    },

    /// Record profile details in a conversation without calling a model
    Intake {
        /// Session identifier
        #[arg(short, long)]
        session: String,

        /// Conversation profile (relationships or personality)
        #[arg(short, long, default_value = "relationships")]
        profile: String,

        /// Detail as label=value; repeat for several
        #[arg(short, long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Remove a document and all its vectors
    Remove {
        /// Document id
        doc_id: String,
    },

    /// Show document and vector counts
    Stats,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Parse a `label=value` pair. The value may be empty.
fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected label=value, got '{}'", raw))?;
    let label = label.trim();
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    Ok((label.to_string(), value.trim().to_string()))
}
