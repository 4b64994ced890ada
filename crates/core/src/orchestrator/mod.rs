//! Lifecycle orchestrator.
//!
//! For each (scene, asset type) work item:
//! - **Metadata**: write the scene sidecar
//! - **Skip**: ledger says downloaded and the file exists
//! - **Activation**: request once per key, then poll until active
//! - **Download**: stream to disk, then record it
//!
//! Items run one at a time unless `max_concurrent_items` says otherwise. All ledger
//! mutations go through one ledger task.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::LifecycleOrchestrator;
pub use types::{FailedItem, ItemError, ItemOutcome, RunMode, RunSummary};
