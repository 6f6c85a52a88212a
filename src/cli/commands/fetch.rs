//! Fetch command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::dataset;
use anyhow::Result;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Run the fetch command.
pub async fn run_fetch(force: bool, settings: Settings) -> Result<()> {
    let current: Mutex<Option<(PathBuf, ProgressBar)>> = Mutex::new(None);

    let on_progress = |path: &Path, received: u64, total: Option<u64>| {
        let Ok(mut current) = current.lock() else {
            return;
        };
        let switched = current.as_ref().map(|(p, _)| p != path).unwrap_or(true);
        if switched {
            if let Some((_, pb)) = current.take() {
                pb.finish_and_clear();
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            *current = Some((path.to_path_buf(), Output::download_bar(total, &name)));
        }
        if let Some((_, pb)) = current.as_ref() {
            pb.set_position(received);
            pb.tick();
        }
    };

    let result = dataset::fetch_dataset(&settings, force, on_progress).await;

    if let Ok(mut current) = current.lock() {
        if let Some((_, pb)) = current.take() {
            pb.finish_and_clear();
        }
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Download failed: {}", e));
            return Err(e.into());
        }
    };

    for (path, bytes) in &report.downloaded {
        Output::success(&format!(
            "Downloaded {} ({})",
            path.display(),
            super::doctor::format_size(*bytes)
        ));
    }
    for path in &report.present {
        Output::info(&format!("Already present: {}", path.display()));
    }
    for path in &report.missing {
        Output::warning(&format!("Missing, no URL configured: {}", path.display()));
    }

    if report.is_complete() {
        if !force && report.downloaded.is_empty() {
            Output::info("Nothing to do. Use --force to download again.");
        }
        Ok(())
    } else {
        Output::info("Set dataset.records_url and dataset.embeddings_url, or MOVIES_CSV_URL and EMBEDDINGS_NPY_URL.");
        anyhow::bail!("{} data file(s) missing", report.missing.len())
    }
}
