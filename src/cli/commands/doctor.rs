//! Doctor command - verify credentials, configuration and data files.

use crate::catalog::Catalog;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// With `deep`, the catalog is loaded to confirm the table and the index line
/// up row for row.
pub fn run_doctor(settings: &Settings, config_path: &Path, deep: bool) -> anyhow::Result<()> {
    Output::header("Cinerag Doctor");
    println!();
    println!("Checking configuration, credentials and data files...\n");

    let mut checks = Vec::new();
    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section(
        "Configuration",
        vec![check_config_file(config_path), check_settings(settings)],
    );
    section(
        "API Configuration",
        vec![check_api_key(settings, |k| std::env::var(k).ok())],
    );
    section("Data Files", check_data_files(settings));
    if deep {
        section("Catalog", vec![check_catalog(settings)]);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Cinerag.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Cinerag is ready to use.");
    }

    Ok(())
}

/// Check the provider's API key.
fn check_api_key<F>(settings: &Settings, lookup: F) -> CheckResult
where
    F: Fn(&str) -> Option<String>,
{
    let var = settings.provider.kind.api_key_var();
    let hint = format!("Set with: export {}='...'", var);
    match lookup(var) {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.chars().count() > 12 => {
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            CheckResult::ok(var, &format!("configured ({}...{})", head, tail))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", &hint),
        None => CheckResult::error(var, "not set", &hint),
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Provider",
            &format!(
                "{} (chat: {}, embeddings: {})",
                settings.provider.kind, settings.rag.model, settings.embedding.model
            ),
        ),
        Err(e) => CheckResult::error("Provider", &e.to_string(), "Run: cinerag config edit"),
    }
}

/// Check that the records and embeddings files exist.
fn check_data_files(settings: &Settings) -> Vec<CheckResult> {
    [
        ("Movie table", settings.records_path(), settings.dataset.records_url.is_some()),
        (
            "Embeddings",
            settings.embeddings_path(),
            settings.dataset.embeddings_url.is_some(),
        ),
    ]
    .into_iter()
    .map(|(name, path, has_url)| match std::fs::metadata(&path) {
        Ok(meta) => CheckResult::ok(
            name,
            &format!("{} ({})", path.display(), format_size(meta.len())),
        ),
        Err(_) if has_url => CheckResult::error(
            name,
            &format!("{} not found", path.display()),
            "Download with: cinerag fetch",
        ),
        Err(_) => CheckResult::error(
            name,
            &format!("{} not found", path.display()),
            "Set a download URL in [dataset] and run: cinerag fetch",
        ),
    })
    .collect()
}

/// Load the catalog and report its shape.
fn check_catalog(settings: &Settings) -> CheckResult {
    match Catalog::load(&settings.records_path(), &settings.embeddings_path()) {
        Ok(catalog) => CheckResult::ok(
            "Alignment",
            &format!(
                "{} movies, {}-dimensional embeddings",
                catalog.len(),
                catalog.dimensions()
            ),
        ),
        Err(e) => CheckResult::error(
            "Alignment",
            &e.to_string(),
            "Re-download both files with: cinerag fetch --force",
        ),
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: cinerag config edit",
        )
    }
}

/// Format file size in human-readable format.
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
