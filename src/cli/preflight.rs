//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and data files are available before loading a
//! large catalog or starting a server that would otherwise fail on first use.

use crate::config::Settings;
use crate::error::{CineragError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs the API key and both data files.
    Ask,
    /// Search embeds the query, so it needs the same as `Ask`.
    Search,
    /// Serving answers questions.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask | Operation::Search | Operation::Serve => {
            check_api_key(settings, |key| std::env::var(key).ok())?;
            check_data_files(settings)?;
        }
    }
    Ok(())
}

/// Check that the provider's API key is set.
fn check_api_key<F>(settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = settings.provider.kind.api_key_var();
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(CineragError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        None => Err(CineragError::Config(format!(
            "{var} not set. Set it with: export {var}='...'"
        ))),
    }
}

/// Check that the records and embeddings files exist.
fn check_data_files(settings: &Settings) -> Result<()> {
    for path in [settings.records_path(), settings.embeddings_path()] {
        if !path.exists() {
            return Err(CineragError::Config(format!(
                "{} not found. Run 'cinerag fetch' or set the dataset paths in the config.",
                path.display()
            )));
        }
    }
    Ok(())
}
