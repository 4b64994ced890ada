//! Asset activation: `unknown --request--> requested --poll success--> active`.

mod asset_activator;
mod config;

pub use asset_activator::AssetActivator;
pub use config::ActivationConfig;

use std::time::Duration;

use thiserror::Error;

use crate::http::HttpError;
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Activation request failed: {0}")]
    RequestFailed(#[source] HttpError),

    #[error("Status check failed: {0}")]
    StatusCheckFailed(#[source] ProviderError),

    #[error("Asset {key} was not active after {waited:?}")]
    TimedOut { key: String, waited: Duration },
}
