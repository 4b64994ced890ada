//! Testing utilities and mock implementations.
//!
//! This module provides mocks for the crate's seams, so the full lifecycle can be
//! exercised without the provider or a real ledger file.
//!
//! # Example
//!
//! ```rust,ignore
//! use scenefetch_core::testing::{fixtures, MemoryLedgerStore, MockTransport};
//!
//! let transport = MockTransport::new();
//! let key = scenefetch_core::AssetKey::new("S1", "ortho_visual");
//! fixtures::script_lifecycle(&transport, &key, "bytes");
//!
//! let store = MemoryLedgerStore::new();
//! // Build an orchestrator over `transport` and `store`...
//! ```

mod memory_ledger;
mod mock_searcher;
mod mock_transport;

pub use memory_ledger::MemoryLedgerStore;
pub use mock_searcher::MockSearcher;
pub use mock_transport::{MockReply, MockTransport, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use serde_json::{json, Map, Value};

    use super::{MockReply, MockTransport};
    use crate::config::Config;
    use crate::http::Method;
    use crate::ledger::AssetKey;
    use crate::search::Scene;

    /// Provider base URL used by fixtures.
    pub const BASE_URL: &str = "https://api.test/data/v1";

    /// Item type of fixture scenes.
    pub const ITEM_TYPE: &str = "PSScene";

    pub fn activate_url(key: &AssetKey) -> String {
        format!("https://api.test/activate/{}", key)
    }

    /// Deliberately unlike the listing URL, so nothing can depend on its shape.
    pub fn self_url(key: &AssetKey) -> String {
        format!("https://api.test/status/{}", key)
    }

    pub fn download_url(key: &AssetKey) -> String {
        format!("https://download.test/{}.tif?signature=abc", key)
    }

    pub fn listing_url(item_id: &str) -> String {
        format!("{}/item-types/{}/items/{}/assets", BASE_URL, ITEM_TYPE, item_id)
    }

    fn asset_entry(key: &AssetKey, status: &str) -> Value {
        json!({
            "status": status,
            "type": key.asset_type(),
            "_links": {
                "activate": activate_url(key),
                "_self": self_url(key),
                "type": format!("https://api.test/asset-types/{}", key.asset_type())
            },
            "_permissions": ["download"]
        })
    }

    /// Asset listing containing only `key`'s asset type.
    pub fn asset_listing(key: &AssetKey, status: &str) -> Value {
        asset_listing_for(std::slice::from_ref(key), status)
    }

    /// Asset listing containing every key's asset type.
    pub fn asset_listing_for(keys: &[AssetKey], status: &str) -> Value {
        let assets: Map<String, Value> = keys
            .iter()
            .map(|key| (key.asset_type().to_string(), asset_entry(key, status)))
            .collect();
        Value::Object(assets)
    }

    /// `GET {self}` body.
    pub fn status_body(status: &str, location: Option<&str>) -> Value {
        let mut body = json!({ "status": status, "type": "basic_analytic_8b" });
        if let Some(location) = location {
            body["location"] = json!(location);
        }
        body
    }

    /// A quick-search feature.
    pub fn scene_json(id: &str, acquired: &str) -> Value {
        json!({
            "id": id,
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": []},
            "properties": {
                "acquired": acquired,
                "item_type": ITEM_TYPE,
                "cloud_cover": 0.05,
                "sun_azimuth": 123.4,
                "sun_elevation": 61.2,
                "view_angle": 3.1,
                "ground_control": true,
                "quality_category": "standard"
            }
        })
    }

    pub fn scene(id: &str, acquired: &str) -> Scene {
        serde_json::from_value(scene_json(id, acquired)).expect("fixture scene is valid")
    }

    /// Configuration pointing at the fixture provider, with output and ledger under `dir`.
    pub fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.provider.base_url = BASE_URL.to_string();
        config.provider.api_key = "test-key".to_string();
        config.output.dir = dir.join("out");
        config.ledger.path = dir.join("planet_status.json");
        config
    }

    /// Scripts a full happy path for `key`: listing, activation accepted, one
    /// `activating` poll then `active`, and `payload` behind the download location.
    ///
    /// The listing holds only `key`'s asset type; use [`script_listing`] afterwards when
    /// several asset types of one item are in play.
    pub fn script_lifecycle(transport: &MockTransport, key: &AssetKey, payload: &str) {
        transport.on(
            Method::Get,
            &listing_url(key.item_id()),
            MockReply::json(200, asset_listing(key, "inactive")),
        );
        transport.on(Method::Post, &activate_url(key), MockReply::status(202));
        transport.on_sequence(
            Method::Get,
            &self_url(key),
            vec![
                MockReply::json(200, status_body("activating", None)),
                MockReply::json(200, status_body("active", Some(&download_url(key)))),
            ],
        );
        transport.on(Method::Get, &download_url(key), MockReply::bytes(200, payload));
    }

    /// Scripts one listing holding all of `keys` (which must share an item id).
    pub fn script_listing(transport: &MockTransport, keys: &[AssetKey]) {
        if let Some(first) = keys.first() {
            transport.on(
                Method::Get,
                &listing_url(first.item_id()),
                MockReply::json(200, asset_listing_for(keys, "inactive")),
            );
        }
    }
}
