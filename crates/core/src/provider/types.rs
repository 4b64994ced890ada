use serde::{Deserialize, Serialize};

/// Provider status value for an asset ready to download.
pub const STATUS_ACTIVE: &str = "active";

/// Links for one asset, resolved fresh each run because they may be short-lived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLinks {
    /// POST here to request activation.
    pub activate: String,
    /// GET here for the current status.
    #[serde(rename = "_self")]
    pub self_link: String,
}

/// Decoded `GET {self link}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStatus {
    pub status: String,
    /// Download URL, present once the asset is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Hex MD5 of the asset bytes, when the provider publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_digest: Option<String>,
}

impl AssetStatus {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}
