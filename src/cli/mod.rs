//! CLI module for Cinerag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;

/// Cinerag - ask questions about a movie catalog
///
/// Retrieves the movies most similar to a question and has a language model
/// answer using only those records.
#[derive(Parser, Debug)]
#[command(name = "cinerag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CINERAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about the movie catalog
    Ask {
        /// The question to ask
        question: String,

        /// Chat model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of movies to place in the context (default: rag.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<NonZeroUsize>,

        /// Also list the movies the answer was grounded on
        #[arg(short, long)]
        sources: bool,
    },

    /// List the movies most similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: NonZeroUsize,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Download the movie table and embeddings if they are missing
    Fetch {
        /// Download even if the files already exist
        #[arg(short, long)]
        force: bool,
    },

    /// Check configuration, credentials and data files
    Doctor {
        /// Also load the catalog and check that records and embeddings line up
        #[arg(long)]
        deep: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Cli {
    /// Default tracing filter: `-v` flags win over the configured level.
    pub fn log_filter(&self, configured: &str) -> String {
        let level = match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!("cinerag={}", level)
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
