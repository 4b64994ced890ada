pub mod activator;
pub mod config;
pub mod downloader;
pub mod http;
pub mod layout;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod search;
pub mod testing;

pub use activator::{ActivationConfig, ActivationError, AssetActivator};
pub use config::{
    load_config, load_config_from_str, require_api_key, validate_config, Config, ConfigError,
    LogFormat, LoggingConfig, MetricsConfig, SanitizedConfig,
};
pub use downloader::{AssetDownloader, DownloadConfig, DownloadError, DownloadOutcome};
pub use http::{
    HttpError, ReqwestTransport, RetryPolicy, RetryingClient, TimeoutConfig, Transport,
    TransportError,
};
pub use layout::{OutputConfig, OutputLayout, SceneMetadata};
pub use ledger::{
    ActivationState, AssetKey, JsonFileLedgerStore, Ledger, LedgerConfig, LedgerError,
    LedgerStore, LedgerSummary,
};
pub use orchestrator::{
    ItemError, ItemOutcome, LifecycleOrchestrator, OrchestratorConfig, RunMode, RunSummary,
};
pub use provider::{ProviderClient, ProviderConfig, ProviderError};
pub use search::{PlanetSearcher, Scene, SearchError, SearchQuery, Searcher, WorkItem};
