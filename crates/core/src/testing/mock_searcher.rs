//! Mock searcher for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::search::{Scene, SearchError, SearchQuery, Searcher};

/// Mock implementation of the Searcher trait.
///
/// Returns configured scenes and records every query it receives.
#[derive(Default)]
pub struct MockSearcher {
    scenes: Mutex<Vec<Scene>>,
    queries: Mutex<Vec<SearchQuery>>,
    next_error: Mutex<Option<SearchError>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenes(scenes: Vec<Scene>) -> Self {
        let searcher = Self::new();
        searcher.set_scenes(scenes);
        searcher
    }

    pub fn set_scenes(&self, scenes: Vec<Scene>) {
        *self.scenes.lock().unwrap() = scenes;
    }

    /// Makes the next search fail with `error`.
    pub fn fail_next(&self, error: SearchError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn recorded_queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Scene>, SearchError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.scenes.lock().unwrap().clone())
    }
}
