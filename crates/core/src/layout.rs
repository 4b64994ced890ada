//! Output directory layout: `{root}/{year}/{YYYY-MM-DD}/`.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::search::{Scene, WorkItem};

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./planet_data")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Contents of `{id}_metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub id: String,
    pub acquired: String,
    pub cloud_cover: Option<f64>,
    pub sun_azimuth: Option<f64>,
    pub sun_elevation: Option<f64>,
    pub view_angle: Option<f64>,
    pub satellite_id: Option<String>,
    pub ground_control: Option<bool>,
    pub item_type: String,
    pub quality_category: Option<String>,
}

impl From<&Scene> for SceneMetadata {
    fn from(scene: &Scene) -> Self {
        let p = &scene.properties;
        Self {
            id: scene.id.clone(),
            acquired: p.acquired.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            cloud_cover: p.cloud_cover,
            sun_azimuth: p.sun_azimuth,
            sun_elevation: p.sun_elevation,
            view_angle: p.view_angle,
            satellite_id: p.satellite_id.clone(),
            ground_control: p.ground_control,
            item_type: p.item_type.clone(),
            quality_category: p.quality_category.clone(),
        }
    }
}

/// Maps scenes and work items to paths under the output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn scene_dir(&self, acquired: &DateTime<Utc>) -> PathBuf {
        self.root
            .join(acquired.year().to_string())
            .join(acquired.format("%Y-%m-%d").to_string())
    }

    /// `{scene dir}/{id}_{asset_type}.tif`
    pub fn asset_path(&self, item: &WorkItem) -> PathBuf {
        self.scene_dir(&item.scene.properties.acquired)
            .join(format!("{}.tif", item.key()))
    }

    /// `{scene dir}/{id}_metadata.json`
    pub fn metadata_path(&self, scene: &Scene) -> PathBuf {
        self.scene_dir(&scene.properties.acquired)
            .join(format!("{}_metadata.json", scene.id))
    }

    /// Writes the metadata sidecar for `scene`, overwriting any previous one.
    pub async fn write_metadata(&self, scene: &Scene) -> std::io::Result<PathBuf> {
        let path = self.metadata_path(scene);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let metadata = SceneMetadata::from(scene);
        let json = serde_json::to_vec_pretty(&metadata).map_err(std::io::Error::other)?;
        tokio::fs::write(&path, json).await?;

        info!(path = %path.display(), "Saved metadata");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::sync::Arc;

    #[test]
    fn test_paths_use_acquisition_date() {
        let layout = OutputLayout::new("/data");
        let scene = fixtures::scene("S1", "2023-06-01T18:24:31.123456Z");
        let item = WorkItem::new(Arc::new(scene.clone()), "basic_analytic_8b");

        assert_eq!(
            layout.asset_path(&item),
            PathBuf::from("/data/2023/2023-06-01/S1_basic_analytic_8b.tif")
        );
        assert_eq!(
            layout.metadata_path(&scene),
            PathBuf::from("/data/2023/2023-06-01/S1_metadata.json")
        );
    }

    #[tokio::test]
    async fn test_write_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let mut scene = fixtures::scene("S1", "2023-06-01T18:24:31Z");
        scene.properties.satellite_id = Some("2474".to_string());

        let path = layout.write_metadata(&scene).await.unwrap();

        let written: SceneMetadata =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.id, "S1");
        assert_eq!(written.acquired, "2023-06-01T18:24:31Z");
        assert_eq!(written.satellite_id.as_deref(), Some("2474"));
        assert_eq!(written.item_type, "PSScene");
    }
}
