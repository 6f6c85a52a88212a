//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{AnswerOutcome, RagService};
use anyhow::Result;
use std::num::NonZeroUsize;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<NonZeroUsize>,
    show_sources: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'cinerag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let spinner = Output::spinner("Loading catalog...");
    let service = match RagService::from_settings(&settings, model.as_deref()).await {
        Ok(service) => service,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to load catalog: {}", e));
            return Err(e.into());
        }
    };
    let service = match top_k {
        Some(k) => service.with_top_k(k),
        None => service,
    };

    spinner.set_message("Searching catalog...");
    let result = service.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer.text);

            if answer.outcome == AnswerOutcome::Grounded && show_sources {
                Output::header("Sources");
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
