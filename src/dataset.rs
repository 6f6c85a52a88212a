//! Dataset bootstrap.
//!
//! Downloads the movie CSV and the embeddings file from configured URLs when
//! they are not already on disk. Files are streamed into a temporary file next
//! to the destination and only moved into place once complete, so an
//! interrupted download never leaves a truncated catalog behind.

use crate::config::Settings;
use crate::error::{CineragError, Result};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// What [`fetch_dataset`] did for each data file.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Files downloaded, with their size in bytes.
    pub downloaded: Vec<(PathBuf, u64)>,
    /// Files already present and left untouched.
    pub present: Vec<PathBuf>,
    /// Files absent locally with no URL configured.
    pub missing: Vec<PathBuf>,
}

impl FetchReport {
    /// Whether both data files are available after the fetch.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Validate a download URL.
pub fn parse_url(raw: &str) -> Result<url::Url> {
    let url = url::Url::parse(raw)
        .map_err(|e| CineragError::Config(format!("invalid dataset URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CineragError::Config(format!(
            "unsupported URL scheme {:?} in {}",
            other, raw
        ))),
    }
}

/// Make sure the records and embeddings files exist locally.
///
/// `on_progress` is called with the file being downloaded, bytes received so
/// far and the total size when the server reports one.
pub async fn fetch_dataset<F>(settings: &Settings, force: bool, on_progress: F) -> Result<FetchReport>
where
    F: Fn(&Path, u64, Option<u64>),
{
    let targets = [
        (settings.records_path(), settings.dataset.records_url.as_deref()),
        (
            settings.embeddings_path(),
            settings.dataset.embeddings_url.as_deref(),
        ),
    ];

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            settings.provider.timeout_secs.max(3600),
        ))
        .build()?;

    let mut report = FetchReport::default();
    for (path, url) in targets {
        if path.exists() && !force {
            info!("{} already present", path.display());
            report.present.push(path);
            continue;
        }

        match url {
            Some(url) => {
                let url = parse_url(url)?;
                let bytes = download_file(&client, &url, &path, &on_progress).await?;
                report.downloaded.push((path, bytes));
            }
            None if path.exists() => report.present.push(path),
            None => {
                warn!("{} is missing and no download URL is configured", path.display());
                report.missing.push(path);
            }
        }
    }

    Ok(report)
}

/// Stream `url` into `destination`, returning the number of bytes written.
#[instrument(skip_all, fields(url = %url, destination = %destination.display()))]
pub async fn download_file<F>(
    client: &reqwest::Client,
    url: &url::Url,
    destination: &Path,
    on_progress: &F,
) -> Result<u64>
where
    F: Fn(&Path, u64, Option<u64>),
{
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    info!("Downloading");
    let response = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()
        .map_err(|e| CineragError::Download(e.to_string()))?;

    let total = response.content_length();
    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    let mut written = 0u64;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CineragError::Download(e.to_string()))?;
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
        on_progress(destination, written, total);
    }

    if let Some(expected) = total {
        if written != expected {
            return Err(CineragError::Download(format!(
                "received {} of {} bytes",
                written, expected
            )));
        }
    }

    file.flush()?;
    file.persist(destination)
        .map_err(|e| CineragError::Io(e.error))?;

    info!("Downloaded {} bytes", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;

    async fn serve(body: &'static str) -> String {
        let app = Router::new()
            .route("/movies.csv", get(move || async move { body }))
            .route(
                "/broken",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "nope") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/embeddings.npy").is_ok());
        assert!(matches!(
            parse_url("ftp://example.com/x"),
            Err(CineragError::Config(_))
        ));
        assert!(parse_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_download_file() {
        let base = serve("title\nAlien\n").await;
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("csv").join("movies.csv");

        let client = reqwest::Client::new();
        let url = parse_url(&format!("{}/movies.csv", base)).unwrap();
        let bytes = download_file(&client, &url, &destination, &|_: &Path, _: u64, _: Option<u64>| {})
            .await
            .unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "title\nAlien\n");
    }

    #[tokio::test]
    async fn test_download_http_error_leaves_nothing() {
        let base = serve("").await;
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("embeddings.npy");

        let client = reqwest::Client::new();
        let url = parse_url(&format!("{}/broken", base)).unwrap();
        let err = download_file(&client, &url, &destination, &|_: &Path, _: u64, _: Option<u64>| {})
            .await
            .unwrap_err();

        assert!(matches!(err, CineragError::Download(_)));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_fetch_dataset_skips_present_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("movies.csv");
        std::fs::write(&records, "title\nHeat\n").unwrap();

        let mut settings = Settings::default();
        settings.dataset.records_path = Some(records.display().to_string());
        settings.dataset.embeddings_path =
            Some(dir.path().join("embeddings.npy").display().to_string());

        let report = fetch_dataset(&settings, false, |_, _, _| {}).await.unwrap();
        assert_eq!(report.present, vec![records]);
        assert_eq!(report.missing.len(), 1);
        assert!(report.downloaded.is_empty());
        assert!(!report.is_complete());
    }
}
