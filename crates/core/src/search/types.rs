//! Types for the scene search collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::http::HttpError;
use crate::ledger::AssetKey;

/// Scene search parameters: a point of interest, a date window and a cloud ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub item_type: String,
    /// Maximum cloud cover in percent (0-100).
    pub max_cloud_cover: f64,
}

impl SearchQuery {
    /// Rejects windows and coordinates the provider would reject anyway.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.start_date > self.end_date {
            return Err(SearchError::InvalidQuery(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SearchError::InvalidQuery(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SearchError::InvalidQuery(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        if !(0.0..=100.0).contains(&self.max_cloud_cover) {
            return Err(SearchError::InvalidQuery(format!(
                "max cloud cover {} is not a percentage",
                self.max_cloud_cover
            )));
        }
        if self.item_type.trim().is_empty() {
            return Err(SearchError::InvalidQuery("item type is empty".to_string()));
        }
        Ok(())
    }

    /// Quick-search request body.
    ///
    /// GeoJSON coordinates are `[longitude, latitude]`; the cloud filter takes a fraction.
    pub fn request_body(&self) -> Value {
        json!({
            "item_types": [self.item_type],
            "filter": {
                "type": "AndFilter",
                "config": [
                    {
                        "type": "GeometryFilter",
                        "field_name": "geometry",
                        "config": {
                            "type": "Point",
                            "coordinates": [self.longitude, self.latitude]
                        }
                    },
                    {
                        "type": "DateRangeFilter",
                        "field_name": "acquired",
                        "config": {
                            "gte": format!("{}T00:00:00.000Z", self.start_date),
                            "lte": format!("{}T23:59:59.999Z", self.end_date)
                        }
                    },
                    {
                        "type": "RangeFilter",
                        "field_name": "cloud_cover",
                        "config": {
                            "lte": self.max_cloud_cover / 100.0
                        }
                    }
                ]
            }
        })
    }
}

/// One scene returned by the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub properties: SceneProperties,
}

/// The subset of scene properties kept in the metadata sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneProperties {
    pub acquired: DateTime<Utc>,
    pub item_type: String,
    #[serde(default)]
    pub cloud_cover: Option<f64>,
    #[serde(default)]
    pub sun_azimuth: Option<f64>,
    #[serde(default)]
    pub sun_elevation: Option<f64>,
    #[serde(default)]
    pub view_angle: Option<f64>,
    #[serde(default)]
    pub satellite_id: Option<String>,
    #[serde(default)]
    pub ground_control: Option<bool>,
    #[serde(default)]
    pub quality_category: Option<String>,
}

/// One (scene, asset type) pair to drive through the lifecycle.
///
/// Immutable once built; the scene is shared by all asset types of the same item.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub scene: Arc<Scene>,
    pub asset_type: String,
}

impl WorkItem {
    pub fn new(scene: Arc<Scene>, asset_type: impl Into<String>) -> Self {
        Self {
            scene,
            asset_type: asset_type.into(),
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::new(&self.scene.id, &self.asset_type)
    }

    pub fn item_type(&self) -> &str {
        &self.scene.properties.item_type
    }

    /// Expands scenes into work items, scene-major, asset types in the given order.
    pub fn expand(scenes: Vec<Scene>, asset_types: &[String]) -> Vec<WorkItem> {
        scenes
            .into_iter()
            .map(Arc::new)
            .flat_map(|scene| {
                asset_types
                    .iter()
                    .map(move |asset_type| WorkItem::new(Arc::clone(&scene), asset_type.clone()))
            })
            .collect()
    }
}

/// Errors that can occur during search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

/// Trait for scene search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Returns every scene matching the query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Scene>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SearchQuery {
        SearchQuery {
            start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            latitude: 37.355138,
            longitude: -120.411734,
            item_type: "PSScene".to_string(),
            max_cloud_cover: 30.0,
        }
    }

    #[test]
    fn test_request_body_filters() {
        let body = query().request_body();
        assert_eq!(body["item_types"], json!(["PSScene"]));

        let filters = body["filter"]["config"].as_array().unwrap();
        assert_eq!(filters.len(), 3);
        assert_eq!(
            filters[0]["config"]["coordinates"],
            json!([-120.411734, 37.355138])
        );
        assert_eq!(filters[1]["config"]["gte"], "2023-06-01T00:00:00.000Z");
        assert_eq!(filters[1]["config"]["lte"], "2023-06-30T23:59:59.999Z");
        assert_eq!(filters[2]["config"]["lte"], json!(0.3));
    }

    #[test]
    fn test_validate_rejects_reversed_window() {
        let mut q = query();
        q.end_date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert!(matches!(q.validate(), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn test_validate_rejects_bad_cloud_cover() {
        let mut q = query();
        q.max_cloud_cover = 130.0;
        assert!(q.validate().is_err());
        assert!(query().validate().is_ok());
    }

    #[test]
    fn test_scene_deserializes_with_sparse_properties() {
        let scene: Scene = serde_json::from_value(json!({
            "id": "S1",
            "type": "Feature",
            "properties": {
                "acquired": "2023-06-01T18:24:31.123456Z",
                "item_type": "PSScene",
                "cloud_cover": 0.05,
                "pixel_resolution": 3
            }
        }))
        .unwrap();

        assert_eq!(scene.id, "S1");
        assert_eq!(scene.properties.cloud_cover, Some(0.05));
        assert!(scene.properties.satellite_id.is_none());
    }

    #[test]
    fn test_expand_is_scene_major() {
        let scene = |id: &str| Scene {
            id: id.to_string(),
            properties: SceneProperties {
                acquired: "2023-06-01T00:00:00Z".parse().unwrap(),
                item_type: "PSScene".to_string(),
                cloud_cover: None,
                sun_azimuth: None,
                sun_elevation: None,
                view_angle: None,
                satellite_id: None,
                ground_control: None,
                quality_category: None,
            },
        };
        let types = vec!["basic_analytic_8b".to_string(), "ortho_visual".to_string()];

        let items = WorkItem::expand(vec![scene("A"), scene("B")], &types);
        let keys: Vec<String> = items.iter().map(|i| i.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "A_basic_analytic_8b",
                "A_ortho_visual",
                "B_basic_analytic_8b",
                "B_ortho_visual"
            ]
        );
        assert!(Arc::ptr_eq(&items[0].scene, &items[1].scene));
    }
}
