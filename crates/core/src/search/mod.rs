//! Scene search.
//!
//! The lifecycle only needs scenes with their properties; how they are found is behind
//! the `Searcher` trait. `PlanetSearcher` is the provider's quick-search adapter.

mod planet;
mod types;

pub use planet::PlanetSearcher;
pub use types::{Scene, SceneProperties, SearchError, SearchQuery, Searcher, WorkItem};
