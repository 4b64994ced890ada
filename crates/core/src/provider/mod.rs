//! Provider asset API.
//!
//! - `GET {base}/item-types/{type}/items/{id}/assets` lists assets with their links
//! - `POST {activate link}` requests activation (see the activator)
//! - `GET {self link}` reports `{status, location?, md5_digest?}`

mod client;
mod types;

pub use client::ProviderClient;
pub use types::{AssetLinks, AssetStatus, STATUS_ACTIVE};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Asset type '{asset_type}' not available for item {item_id}")]
    MissingAsset { item_id: String, asset_type: String },

    #[error("Asset links for {key} are missing required entries: {detail}")]
    MissingLinks { key: String, detail: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether the failure came from the network rather than the response contents.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Provider endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; falls back to the `PLANET_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.planet.com/data/v1".to_string()
}
