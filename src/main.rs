//! CLI entry point for ghfetch.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ghfetch_core::download::filename::resolve_unique_path;
use ghfetch_core::{
    Artifact, Database, DownloadCounter, DownloadError, Downloader, HttpClient, KeyValueStore,
    SqliteStore,
};
use tracing::{debug, error, info};

mod app_config;
mod cli;
mod progress;

use app_config::{Settings, load_default_file_config};
use cli::Args;
use progress::DownloadProgress;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_config = load_default_file_config()?;
    let settings = Settings::resolve(&args, file_config.as_ref())?;
    debug!(?settings, "Effective settings");

    if args.urls.is_empty() && !args.count {
        println!("No URLs given. Usage: ghfetch [OPTIONS] <URL>...");
        println!("Example: ghfetch https://github.com/owner/repo/releases/download/v1.0/tool.zip");
        return Ok(ExitCode::SUCCESS);
    }

    let db = Database::new(&settings.state_db).await.with_context(|| {
        format!(
            "Failed to open state database '{}'",
            settings.state_db.display()
        )
    })?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(db));
    let counter = Arc::new(DownloadCounter::load(store).await);

    if args.count {
        println!("Total downloads: {}", counter.current_count().await);
        return Ok(ExitCode::SUCCESS);
    }

    let client = HttpClient::try_new(settings.config.connect_timeout())
        .context("Failed to build HTTP client")?;
    let downloader = Arc::new(
        Downloader::new(settings.config.clone(), Arc::new(client), Arc::clone(&counter))
            .context("Invalid download configuration")?,
    );

    info!(urls = args.urls.len(), "ghfetch starting");

    let show_progress = !args.quiet && io::stderr().is_terminal();
    let mut failed = 0_usize;

    for input in &args.urls {
        let mut handle = downloader.submit_download(input);
        let mut display = DownloadProgress::new(show_progress);
        while let Some(event) = handle.next_event().await {
            display.apply(&event);
        }
        display.finish();

        let outcome = handle.result().await;
        if !report_outcome(input, outcome, &settings.output_dir, &counter).await {
            failed += 1;
        }
    }

    if failed > 0 {
        info!(failed, total = args.urls.len(), "Finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Saves a successful download and prints the result line. Returns `false` on
/// any failure so the caller can move on to the next URL.
async fn report_outcome(
    input: &str,
    outcome: Result<Artifact, DownloadError>,
    output_dir: &Path,
    counter: &DownloadCounter,
) -> bool {
    let artifact = match outcome {
        Ok(artifact) => artifact,
        Err(error) => {
            debug!(input = %input, error = %error, "Download failed");
            eprintln!("{}", error.user_message());
            return false;
        }
    };

    match save_artifact(output_dir, &artifact).await {
        Ok(path) => {
            println!("Download complete: {}", path.display());
            println!("Total downloads: {}", counter.current_count().await);
            true
        }
        Err(error) => {
            error!(input = %input, error = %format!("{error:#}"), "Saving download failed");
            eprintln!("Could not save {}: {error:#}", artifact.filename);
            false
        }
    }
}

async fn save_artifact(output_dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let path = resolve_unique_path(output_dir, &artifact.filename);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    debug!(path = %path.display(), bytes = artifact.len(), "Artifact saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghfetch_core::MemoryStore;

    fn artifact(filename: &str) -> Artifact {
        Artifact {
            bytes: b"PK".to_vec(),
            content_type: "application/zip".to_string(),
            filename: filename.to_string(),
        }
    }

    async fn counter() -> DownloadCounter {
        DownloadCounter::load(Arc::new(MemoryStore::new())).await
    }

    #[tokio::test]
    async fn test_save_failure_is_reported_and_next_url_still_saved() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, b"file in the way").unwrap();
        let counter = counter().await;

        let first = report_outcome("first", Ok(artifact("a.zip")), &blocked, &counter).await;
        let second = report_outcome("second", Ok(artifact("b.zip")), dir.path(), &counter).await;

        assert!(!first);
        assert!(second);
        assert_eq!(std::fs::read(dir.path().join("b.zip")).unwrap(), b"PK");
    }

    #[tokio::test]
    async fn test_download_error_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let counter = counter().await;
        let outcome = Err(DownloadError::network("https://github.com/a/b/raw/main/x.zip", 404));

        assert!(!report_outcome("x", outcome, dir.path(), &counter).await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_artifact_deduplicates_names() {
        let dir = tempfile::tempdir().unwrap();

        let first = save_artifact(dir.path(), &artifact("tool.zip")).await.unwrap();
        let second = save_artifact(dir.path(), &artifact("tool.zip")).await.unwrap();

        assert_eq!(first, dir.path().join("tool.zip"));
        assert_eq!(second, dir.path().join("tool_1.zip"));
    }
}
