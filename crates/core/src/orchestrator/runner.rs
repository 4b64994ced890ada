//! Lifecycle orchestrator implementation.
//!
//! Drives each work item through metadata, activation, polling and download, with the
//! ledger consulted first so a repeated run does no repeated work.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info, info_span, warn, Instrument};

use crate::activator::AssetActivator;
use crate::config::Config;
use crate::downloader::AssetDownloader;
use crate::http::{RetryingClient, Transport};
use crate::layout::OutputLayout;
use crate::ledger::{create_ledger_system, AssetKey, LedgerError, LedgerHandle, LedgerStore, Transition};
use crate::metrics;
use crate::provider::{AssetLinks, ProviderClient};
use crate::search::WorkItem;

use super::config::OrchestratorConfig;
use super::types::{FailedItem, ItemError, ItemOutcome, RunMode, RunSummary};

const LEDGER_BUFFER: usize = 32;

/// Drives work items from search results to files on disk.
pub struct LifecycleOrchestrator {
    config: OrchestratorConfig,
    provider: ProviderClient,
    activator: AssetActivator,
    downloader: AssetDownloader,
    layout: OutputLayout,
    store: Arc<dyn LedgerStore>,
}

impl LifecycleOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        provider: ProviderClient,
        activator: AssetActivator,
        downloader: AssetDownloader,
        layout: OutputLayout,
        store: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            config,
            provider,
            activator,
            downloader,
            layout,
            store,
        }
    }

    /// Wires every component from configuration over one shared transport.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<dyn LedgerStore>,
    ) -> Self {
        let http = RetryingClient::new(transport, config.retry.clone());
        let request_timeout = config.timeouts.request();
        let provider = ProviderClient::new(
            http.clone(),
            config.provider.base_url.clone(),
            request_timeout,
        );
        let activator = AssetActivator::new(
            http.clone(),
            provider.clone(),
            config.activation.clone(),
            request_timeout,
        );
        let downloader = AssetDownloader::new(
            http,
            provider.clone(),
            config.download.clone(),
            config.timeouts.download(),
        );

        Self::new(
            config.orchestrator.clone(),
            provider,
            activator,
            downloader,
            OutputLayout::new(config.output.dir.clone()),
            store,
        )
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Processes every work item and returns the tally.
    ///
    /// A ledger that cannot be loaded ends the run before any item is touched. Every
    /// other failure is local to its item.
    pub async fn run(&self, items: Vec<WorkItem>, mode: RunMode) -> Result<RunSummary, LedgerError> {
        let ledger = self.store.load().map_err(|e| {
            error!("Refusing to run with an unreadable ledger: {}", e);
            e
        })?;

        let (handle, writer) = create_ledger_system(Arc::clone(&self.store), ledger, LEDGER_BUFFER);
        let writer_task = tokio::spawn(writer.run());

        let total = items.len();
        let concurrency = self.config.max_concurrent_items.max(1);
        info!(total, concurrency, ?mode, "Processing work items");

        let results: Vec<(AssetKey, Result<ItemOutcome, ItemError>)> =
            futures::stream::iter(items)
                .map(|item| {
                    let handle = handle.clone();
                    let key = item.key();
                    let span = info_span!("item", key = %key);
                    async move {
                        let result = self.process_item(&item, &handle, mode).await;
                        (key, result)
                    }
                    .instrument(span)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        drop(handle);
        if let Err(e) = writer_task.await {
            error!("Ledger task ended abnormally: {}", e);
        }

        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };
        for (key, result) in results {
            match result {
                Ok(outcome) => {
                    metrics::ITEMS.with_label_values(&[outcome.label()]).inc();
                    summary.successful += 1;
                }
                Err(e) => {
                    error!(key = %key, "Work item failed: {}", e);
                    metrics::ITEMS.with_label_values(&["failed"]).inc();
                    summary.failed.push(FailedItem {
                        key: key.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Processed {} out of {} assets successfully",
            summary.successful, summary.total
        );
        Ok(summary)
    }

    async fn process_item(
        &self,
        item: &WorkItem,
        ledger: &LedgerHandle,
        mode: RunMode,
    ) -> Result<ItemOutcome, ItemError> {
        let key = item.key();
        let dest = self.layout.asset_path(item);
        info!(
            scene = %item.scene.id,
            asset_type = %item.asset_type,
            "Processing asset type {} for scene {}",
            item.asset_type,
            item.scene.id
        );

        // The sidecar is informational; losing it does not fail the item.
        if let Err(e) = self.layout.write_metadata(&item.scene).await {
            warn!("Failed to write metadata for scene {}: {}", item.scene.id, e);
        }

        let record = ledger.record(&key).await?;

        if record.downloaded {
            if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                info!("Asset {} already downloaded, skipping", key);
                return Ok(ItemOutcome::AlreadyDownloaded);
            }
            warn!(
                path = %dest.display(),
                "Asset {} recorded as downloaded but the file is missing, downloading again",
                key
            );
            ledger.apply(&key, Transition::DownloadCleared).await?;
        }

        let links = match record.activation {
            Some(state) => {
                info!(state = %state, "Asset {} already activated, skipping activation request", key);
                if mode.is_activate_only() {
                    return Ok(ItemOutcome::Activated);
                }
                let links = self.resolve_links(item, &key).await?;
                self.activator
                    .poll_until_active(&key, &links.self_link)
                    .await?;
                ledger.apply(&key, Transition::Active).await?;
                links
            }
            None => {
                let links = self.resolve_links(item, &key).await?;
                self.activator
                    .request_activation(&key, &links.activate)
                    .await?;
                ledger.apply(&key, Transition::Requested).await?;
                info!("Asset {} activation requested successfully", key);

                if mode.is_activate_only() {
                    return Ok(ItemOutcome::Activated);
                }
                self.activator
                    .poll_until_active(&key, &links.self_link)
                    .await?;
                ledger.apply(&key, Transition::Active).await?;
                links
            }
        };

        let outcome = self
            .downloader
            .download(&key, &links.self_link, &dest)
            .await?;
        ledger.apply(&key, Transition::Downloaded).await?;

        Ok(ItemOutcome::Downloaded(outcome))
    }

    async fn resolve_links(&self, item: &WorkItem, key: &AssetKey) -> Result<AssetLinks, ItemError> {
        let links = self.provider.asset_links(item.item_type(), key).await?;
        info!(
            "Found activation link for {}: {}",
            item.asset_type, links.activate
        );
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::ledger::{ActivationState, Ledger};
    use crate::testing::{fixtures, MemoryLedgerStore, MockReply, MockTransport};

    fn setup(dir: &std::path::Path) -> (Arc<MockTransport>, Arc<MemoryLedgerStore>, LifecycleOrchestrator) {
        let transport = Arc::new(MockTransport::new());
        let store = Arc::new(MemoryLedgerStore::new());
        let config = fixtures::config(dir);
        let orchestrator = LifecycleOrchestrator::from_config(
            &config,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&store) as Arc<dyn LedgerStore>,
        );
        (transport, store, orchestrator)
    }

    fn item() -> WorkItem {
        WorkItem::new(
            Arc::new(fixtures::scene("S1", "2023-06-01T18:24:31Z")),
            "basic_analytic_8b",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_asset_type_fails_only_that_item() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, store, orchestrator) = setup(dir.path());
        let other = WorkItem::new(Arc::clone(&item().scene), "ortho_visual");
        fixtures::script_lifecycle(&transport, &other.key(), "payload");

        let summary = orchestrator
            .run(vec![item(), other.clone()], RunMode::Download)
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].key, "S1_basic_analytic_8b");
        assert!(store.saved().unwrap().is_downloaded(&other.key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_failure_leaves_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, store, orchestrator) = setup(dir.path());
        let key = item().key();
        fixtures::script_lifecycle(&transport, &key, "payload");
        transport.on(Method::Post, &fixtures::activate_url(&key), MockReply::status(500));

        let summary = orchestrator.run(vec![item()], RunMode::Download).await.unwrap();

        assert_eq!(summary.successful, 0);
        assert_eq!(store.save_count(), 0);
        assert_eq!(transport.count(Method::Post, &fixtures::activate_url(&key)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_save_failure_fails_item() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, store, orchestrator) = setup(dir.path());
        fixtures::script_lifecycle(&transport, &item().key(), "payload");
        store.fail_saves(true);

        let summary = orchestrator.run(vec![item()], RunMode::Download).await.unwrap();

        assert_eq!(summary.successful, 0);
        assert!(summary.failed[0].error.contains("ledger update failed"));
        // The item stops before polling once the requested state cannot be recorded.
        assert_eq!(transport.count(Method::Get, &fixtures::self_url(&item().key())), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sidecar_written_even_when_item_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_transport, _store, orchestrator) = setup(dir.path());

        let summary = orchestrator.run(vec![item()], RunMode::Download).await.unwrap();

        assert_eq!(summary.successful, 0);
        assert!(orchestrator.layout().metadata_path(&item().scene).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_entry_in_activate_only_mode_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (transport, store, orchestrator) = setup(dir.path());
        let mut ledger = Ledger::new();
        ledger.mark_requested(&item().key());
        ledger.mark_active(&item().key());
        store.seed(ledger);

        let summary = orchestrator
            .run(vec![item()], RunMode::ActivateOnly)
            .await
            .unwrap();

        assert_eq!(summary.successful, 1);
        assert!(transport.calls().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_items_share_one_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        let store = Arc::new(MemoryLedgerStore::new());
        let mut config = fixtures::config(dir.path());
        config.orchestrator.max_concurrent_items = 4;
        let orchestrator = LifecycleOrchestrator::from_config(
            &config,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&store) as Arc<dyn LedgerStore>,
        );

        let scenes: Vec<_> = (1..=4)
            .map(|i| fixtures::scene(&format!("S{}", i), "2023-06-01T18:24:31Z"))
            .collect();
        let types = vec!["ortho_visual".to_string()];
        let items = WorkItem::expand(scenes, &types);
        for item in &items {
            fixtures::script_lifecycle(&transport, &item.key(), "payload");
        }

        let summary = orchestrator.run(items.clone(), RunMode::Download).await.unwrap();

        assert_eq!(summary.successful, 4);
        let saved = store.saved().unwrap();
        for item in &items {
            assert_eq!(saved.activation(&item.key()), Some(ActivationState::Active));
            assert!(saved.is_downloaded(&item.key()));
        }
    }
}
