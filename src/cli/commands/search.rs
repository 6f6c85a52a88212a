//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagService;
use anyhow::Result;
use std::num::NonZeroUsize;

/// Run the search command.
pub async fn run_search(query: &str, limit: NonZeroUsize, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;

    let spinner = Output::spinner("Loading catalog...");
    let service = RagService::from_settings(&settings, None).await;
    let service = match service {
        Ok(service) => service,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    spinner.set_message("Searching...");
    let results = service.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(sources) => {
            if sources.is_empty() {
                Output::warning("The catalog is empty.");
            } else {
                Output::success(&format!("Top {} of {} movies", sources.len(), service.catalog().len()));
                for (i, source) in sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
