use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use harvester_core::{
    CheckpointWriter, FetchSettings, HarvestEngine, HarvestReport, HttpClient, HttpFetcher,
    SourceKind, WorkItem, api_items, read_catalog,
};
use tracing::{debug, info};

use super::config::HarvestConfig;
use super::progress::ProgressReporter;

/// Runs one harvest with a resolved configuration.
pub(crate) async fn run_harvest(config: &HarvestConfig, show_progress: bool) -> Result<HarvestReport> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    let items = build_items(config)?;
    info!(
        items = items.len(),
        mode = ?config.mode,
        output_dir = %config.output_dir.display(),
        "Harvest starting"
    );

    let client = HttpClient::with_settings(config.request_timeout, &config.user_agent)
        .context("Failed to build HTTP client")?;
    let fetcher = HttpFetcher::new(
        client,
        FetchSettings {
            output_dir: config.output_dir.clone(),
            filename_prefix: config.filename_prefix.clone(),
            index_width: config.index_width,
            public_url_prefix: config.public_url_prefix(),
        },
    );

    let writer = build_writer(config);
    let engine = HarvestEngine::new(config.concurrency, config.checkpoint_interval)?
        .with_request_delay(config.request_delay)
        .with_observer(Arc::new(ProgressReporter::new(show_progress)));
    debug!(?engine, "Engine configured");

    let report = engine.run(items, Arc::new(fetcher), &writer).await?;
    Ok(report)
}

fn build_items(config: &HarvestConfig) -> Result<Vec<WorkItem>> {
    match config.mode {
        SourceKind::Catalog => read_catalog(&config.catalog_path).with_context(|| {
            format!(
                "Failed to load catalog '{}'",
                config.catalog_path.display()
            )
        }),
        SourceKind::Api => Ok(api_items(&config.api_url, config.target_count)),
    }
}

fn build_writer(config: &HarvestConfig) -> CheckpointWriter {
    let writer = CheckpointWriter::new(&config.output_dir, &config.base_url, config.mode)
        .with_file_names(&config.manifest_name, &config.table_name);
    match config.mode {
        SourceKind::Api => writer.with_source(&config.api_source, &config.api_url),
        SourceKind::Catalog => writer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_items_api_mode_uses_target_count() {
        let mut config = HarvestConfig::resolve(None);
        config.target_count = 4;
        let items = build_items(&config).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[3].id, 4);
    }

    #[test]
    fn test_build_items_missing_catalog_is_fatal() {
        let mut config = HarvestConfig::resolve(None);
        config.mode = SourceKind::Catalog;
        config.catalog_path = PathBuf::from("/definitely/not/a/catalog.csv");
        let err = build_items(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to load catalog"));
    }

    #[test]
    fn test_build_writer_names_and_source() {
        let mut config = HarvestConfig::resolve(None);
        config.output_dir = PathBuf::from("out");
        config.manifest_name = "index.json".to_string();
        let writer = build_writer(&config);
        assert_eq!(writer.manifest_path(), PathBuf::from("out/index.json"));
        assert_eq!(writer.table_path(), PathBuf::from("out/directory.csv"));
    }

    #[tokio::test]
    async fn test_run_harvest_catalog_with_duplicate_ids_aborts_before_fetch() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = dir.path().join("catalog.csv");
        fs::write(
            &catalog,
            "id,url,description\n1,http://127.0.0.1:9/a.png,a\n1,http://127.0.0.1:9/b.png,b\n",
        )
        .unwrap();

        let mut config = HarvestConfig::resolve(None);
        config.mode = SourceKind::Catalog;
        config.catalog_path = catalog;
        config.output_dir = dir.path().join("static");

        let err = run_harvest(&config, false).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load catalog"));
        assert!(!config.output_dir.join("directory.json").exists());
    }
}
