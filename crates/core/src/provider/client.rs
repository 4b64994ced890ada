//! Provider asset API client.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::http::{HttpRequest, RetryingClient};
use crate::ledger::AssetKey;

use super::types::{AssetLinks, AssetStatus};
use super::ProviderError;

/// Reads asset listings and asset status from the provider.
#[derive(Clone)]
pub struct ProviderClient {
    http: RetryingClient,
    base_url: String,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(http: RetryingClient, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// `{base}/item-types/{item_type}/items/{item_id}/assets`
    pub fn assets_url(&self, item_type: &str, item_id: &str) -> String {
        format!(
            "{}/item-types/{}/items/{}/assets",
            self.base_url,
            urlencoding::encode(item_type),
            urlencoding::encode(item_id)
        )
    }

    /// Resolves the activate and self links for one asset.
    ///
    /// A missing asset type or missing links is a precondition failure; the listing
    /// itself is fetched under the retry policy.
    pub async fn asset_links(
        &self,
        item_type: &str,
        key: &AssetKey,
    ) -> Result<AssetLinks, ProviderError> {
        let url = self.assets_url(item_type, key.item_id());
        debug!(key = %key, url = %url, "Fetching asset listing");

        let response = self
            .http
            .execute(&HttpRequest::get(&url).with_timeout(self.timeout))
            .await?;

        let mut assets: HashMap<String, Value> = response
            .json()
            .map_err(|e| ProviderError::Decode(format!("asset listing for {}: {}", key, e)))?;

        let asset = assets
            .remove(key.asset_type())
            .ok_or_else(|| ProviderError::MissingAsset {
                item_id: key.item_id().to_string(),
                asset_type: key.asset_type().to_string(),
            })?;

        let links = asset
            .get("_links")
            .ok_or_else(|| ProviderError::MissingLinks {
                key: key.to_string(),
                detail: format!("no _links in asset data: {}", asset),
            })?;

        serde_json::from_value(links.clone()).map_err(|e| ProviderError::MissingLinks {
            key: key.to_string(),
            detail: format!("{} in {}", e, links),
        })
    }

    /// Fetches and decodes the current status behind a self link.
    pub async fn asset_status(&self, self_link: &str) -> Result<AssetStatus, ProviderError> {
        let response = self
            .http
            .execute(&HttpRequest::get(self_link).with_timeout(self.timeout))
            .await?;

        response
            .json()
            .map_err(|e| ProviderError::Decode(format!("asset status from {}: {}", self_link, e)))
    }
}
