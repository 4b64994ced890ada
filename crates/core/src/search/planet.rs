//! Quick-search adapter for the provider's data API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{HttpRequest, RetryingClient};

use super::types::{Scene, SearchError, SearchQuery, Searcher};

/// One page of quick-search results.
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    features: Vec<Scene>,
    #[serde(default, rename = "_links")]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    #[serde(default, rename = "_next")]
    next: Option<String>,
}

/// Searches scenes with `POST {base}/quick-search`, following `_next` page links.
pub struct PlanetSearcher {
    http: RetryingClient,
    search_url: String,
    timeout: Duration,
}

impl PlanetSearcher {
    pub fn new(http: RetryingClient, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            search_url: format!("{}/quick-search", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    async fn fetch_page(&self, request: HttpRequest) -> Result<SearchPage, SearchError> {
        let response = self.http.execute(&request.with_timeout(self.timeout)).await?;
        response
            .json()
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Searcher for PlanetSearcher {
    fn name(&self) -> &str {
        "planet"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Scene>, SearchError> {
        query.validate()?;
        info!(
            item_type = %query.item_type,
            start = %query.start_date,
            end = %query.end_date,
            "Searching for imagery"
        );

        let first = HttpRequest::post(&self.search_url).with_json(query.request_body());
        let mut page = self.fetch_page(first).await?;
        let mut scenes = Vec::new();

        loop {
            let next = page.links.and_then(|l| l.next);
            let empty = page.features.is_empty();
            scenes.extend(page.features);

            match next {
                Some(url) if !empty => {
                    debug!(url = %url, collected = scenes.len(), "Fetching next search page");
                    page = self.fetch_page(HttpRequest::get(url)).await?;
                }
                _ => break,
            }
        }

        info!(count = scenes.len(), "Found {} scenes matching the criteria", scenes.len());
        Ok(scenes)
    }
}
