//! CLI output formatting utilities.

use crate::rag::Source;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a retrieved movie.
    pub fn source(rank: usize, source: &Source) {
        println!("{}", format_source(rank, source));
    }

    /// Create a byte progress bar. Falls back to a spinner when the size is unknown.
    pub fn download_bar(total: Option<u64>, msg: &str) -> ProgressBar {
        let pb = match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(bar_style) = ProgressStyle::default_bar().template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                ) {
                    pb.set_style(bar_style.progress_chars("#>-"));
                }
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// One line per retrieved movie: rank, title, year and score.
fn format_source(rank: usize, source: &Source) -> String {
    let year = source
        .year
        .as_deref()
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    format!(
        "  {:>2}. {}{} {}",
        rank,
        style(&source.title).bold(),
        year,
        style(format!("score: {:.3}, #{}", source.score, source.index)).dim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_source() {
        console::set_colors_enabled(false);
        let source = Source {
            index: 41,
            title: "Heat".to_string(),
            year: Some("1995".to_string()),
            score: 0.87654,
        };
        assert_eq!(format_source(1, &source), "   1. Heat (1995) score: 0.877, #41");

        let undated = Source {
            year: None,
            ..source
        };
        assert_eq!(format_source(10, &undated), "  10. Heat score: 0.877, #41");
    }
}
