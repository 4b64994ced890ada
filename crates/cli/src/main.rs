mod cli;
mod logging;
mod summary;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, info_span, warn, Instrument};

use scenefetch_core::{
    load_config, metrics, require_api_key, validate_config, Config, JsonFileLedgerStore,
    LedgerStore, LifecycleOrchestrator, PlanetSearcher, ReqwestTransport, RetryingClient,
    SanitizedConfig, SearchQuery, Searcher, Transport, WorkItem,
};

use cli::{Cli, Command, RunArgs};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Command::Run(args) = &cli.command {
        if let Some(dir) = &args.output_dir {
            config.output.dir = dir.clone();
        }
    }
    validate_config(&config).context("Invalid configuration")?;

    logging::init(&config.logging)?;
    debug!(config = ?SanitizedConfig::from(&config), "Configuration loaded");

    match cli.command {
        Command::Run(args) => {
            let run_id = uuid::Uuid::new_v4();
            run_lifecycle(config, args)
                .instrument(info_span!("run", %run_id))
                .await
        }
        Command::Status { json } => show_status(&config, json),
    }
}

async fn run_lifecycle(config: Config, args: RunArgs) -> Result<()> {
    info!("Starting scenefetch v{}", VERSION);

    let api_key = require_api_key(&config)?;
    let query = args.query();
    query.validate().context("Invalid search parameters")?;

    tokio::fs::create_dir_all(&config.output.dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", config.output.dir))?;

    let store: Arc<dyn LedgerStore> = Arc::new(JsonFileLedgerStore::new(&config.ledger.path));
    let ledger = store.load().context("Failed to load ledger")?;
    summary::log_status(&ledger.summary());

    let transport: Arc<dyn Transport> =
        Arc::new(ReqwestTransport::new(api_key).context("Failed to build HTTP client")?);

    let searcher = PlanetSearcher::new(
        RetryingClient::new(Arc::clone(&transport), config.retry.clone()),
        &config.provider.base_url,
        config.timeouts.request(),
    );
    let Some(items) = search_work_items(&searcher, &query, &args.asset_types).await else {
        return Ok(());
    };

    let mode = args.mode();
    let orchestrator = LifecycleOrchestrator::from_config(&config, transport, Arc::clone(&store));
    let run_summary = orchestrator
        .run(items, mode)
        .await
        .context("Ledger failure")?;

    if !run_summary.all_succeeded() {
        warn!("{} assets failed, rerun to retry them", run_summary.failed.len());
    }
    if mode.is_activate_only() {
        info!(
            "Activation requests completed. Run again later without --activate-only to download the assets."
        );
    }

    match store.load() {
        Ok(ledger) => summary::log_status(&ledger.summary()),
        Err(e) => warn!(error = %e, "Failed to reload ledger for the final summary"),
    }

    if let Some(path) = &config.metrics.path {
        write_metrics(path);
    }

    Ok(())
}

/// Runs the search and expands scenes into work items. `None` ends the run without failing it.
async fn search_work_items(
    searcher: &dyn Searcher,
    query: &SearchQuery,
    asset_types: &[String],
) -> Option<Vec<WorkItem>> {
    info!(
        "Searching {} imagery from {} to {} at ({}, {})",
        query.item_type, query.start_date, query.end_date, query.latitude, query.longitude
    );
    let scenes = match searcher.search(query).await {
        Ok(scenes) if scenes.is_empty() => {
            error!("No imagery found for the given parameters");
            return None;
        }
        Ok(scenes) => scenes,
        Err(e) => {
            error!(searcher = searcher.name(), error = %e, "Search failed");
            return None;
        }
    };
    info!("Found {} scenes", scenes.len());

    Some(WorkItem::expand(scenes, asset_types))
}

fn show_status(config: &Config, json: bool) -> Result<()> {
    let ledger = JsonFileLedgerStore::new(&config.ledger.path)
        .load()
        .context("Failed to load ledger")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ledger)?);
    } else {
        summary::log_status(&ledger.summary());
    }
    Ok(())
}

fn write_metrics(path: &Path) {
    match metrics::write_to(path) {
        Ok(()) => info!("Metrics written to {:?}", path),
        Err(e) => warn!(error = %e, "Failed to write metrics to {:?}", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use scenefetch_core::testing::{fixtures, MockSearcher};
    use scenefetch_core::SearchError;

    fn query() -> SearchQuery {
        SearchQuery {
            start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            latitude: 37.355138,
            longitude: -120.411734,
            item_type: fixtures::ITEM_TYPE.to_string(),
            max_cloud_cover: 30.0,
        }
    }

    fn asset_types() -> Vec<String> {
        vec!["basic_analytic_8b".to_string(), "ortho_visual".to_string()]
    }

    #[tokio::test]
    async fn test_search_expands_every_asset_type() {
        let searcher = MockSearcher::with_scenes(vec![
            fixtures::scene("S1", "2023-06-01T18:24:31Z"),
            fixtures::scene("S2", "2023-06-02T18:24:31Z"),
        ]);

        let items = search_work_items(&searcher, &query(), &asset_types())
            .await
            .unwrap();

        let keys: Vec<String> = items.iter().map(|i| i.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "S1_basic_analytic_8b",
                "S1_ortho_visual",
                "S2_basic_analytic_8b",
                "S2_ortho_visual"
            ]
        );
        assert_eq!(searcher.recorded_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_ends_run() {
        let searcher = MockSearcher::new();
        assert!(search_work_items(&searcher, &query(), &asset_types())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_search_ends_run() {
        let searcher = MockSearcher::with_scenes(vec![fixtures::scene("S1", "2023-06-01T18:24:31Z")]);
        searcher.fail_next(SearchError::Decode("bad page".to_string()));

        assert!(search_work_items(&searcher, &query(), &asset_types())
            .await
            .is_none());
    }
}
