use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::LedgerError;

/// Structured identity of one lifecycle record: an item and one of its asset types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    item_id: String,
    asset_type: String,
}

impl AssetKey {
    pub fn new(item_id: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            asset_type: asset_type.into(),
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn asset_type(&self) -> &str {
        &self.asset_type
    }
}

/// Persisted form: `{item_id}_{asset_type}`.
impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.item_id, self.asset_type)
    }
}

/// Provider-side activation progress. Absence from the ledger means unknown.
///
/// Ordered so that a transition is allowed only when it moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivationState {
    /// Activation was requested and has not been observed active yet.
    #[serde(rename = "activating")]
    Requested,
    /// The provider reported the asset active.
    #[serde(rename = "active")]
    Active,
}

impl ActivationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationState::Requested => "activating",
            ActivationState::Active => "active",
        }
    }
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ledger's view of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetRecord {
    pub activation: Option<ActivationState>,
    pub downloaded: bool,
}

/// Whole-file snapshot of activation and download progress.
///
/// Serializes as `{"activated_scenes": {...}, "downloaded_scenes": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "activated_scenes", default)]
    activated: BTreeMap<String, ActivationState>,
    #[serde(rename = "downloaded_scenes", default)]
    downloaded: BTreeMap<String, bool>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activation(&self, key: &AssetKey) -> Option<ActivationState> {
        self.activated.get(&key.to_string()).copied()
    }

    pub fn is_downloaded(&self, key: &AssetKey) -> bool {
        self.downloaded
            .get(&key.to_string())
            .copied()
            .unwrap_or(false)
    }

    pub fn record(&self, key: &AssetKey) -> AssetRecord {
        AssetRecord {
            activation: self.activation(key),
            downloaded: self.is_downloaded(key),
        }
    }

    /// Records that activation was requested. Returns whether the ledger changed.
    pub fn mark_requested(&mut self, key: &AssetKey) -> bool {
        self.advance(key, ActivationState::Requested)
    }

    /// Records that the asset is active. Returns whether the ledger changed.
    pub fn mark_active(&mut self, key: &AssetKey) -> bool {
        self.advance(key, ActivationState::Active)
    }

    /// Records a completed download. Only allowed once the asset is active.
    pub fn mark_downloaded(&mut self, key: &AssetKey) -> Result<bool, LedgerError> {
        if self.activation(key) != Some(ActivationState::Active) {
            return Err(LedgerError::NotActive {
                key: key.to_string(),
            });
        }
        let previous = self.downloaded.insert(key.to_string(), true);
        Ok(previous != Some(true))
    }

    /// Forgets a download whose file is gone. Activation state is kept.
    pub fn clear_downloaded(&mut self, key: &AssetKey) -> bool {
        self.downloaded.remove(&key.to_string()).is_some()
    }

    /// Moves activation forward; a backwards or repeated transition is ignored.
    fn advance(&mut self, key: &AssetKey, to: ActivationState) -> bool {
        let key = key.to_string();
        match self.activated.get(&key) {
            Some(current) if *current >= to => false,
            _ => {
                self.activated.insert(key, to);
                true
            }
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            activated: self
                .activated
                .iter()
                .map(|(key, state)| (key.clone(), *state))
                .collect(),
            downloaded: self
                .downloaded
                .iter()
                .filter(|(_, done)| **done)
                .map(|(key, _)| key.clone())
                .collect(),
        }
    }
}

/// Flattened view for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub activated: Vec<(String, ActivationState)>,
    pub downloaded: Vec<String>,
}

impl LedgerSummary {
    pub fn active_count(&self) -> usize {
        self.activated
            .iter()
            .filter(|(_, state)| *state == ActivationState::Active)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AssetKey {
        AssetKey::new("S1", "basic_analytic_8b")
    }

    #[test]
    fn test_asset_key_display() {
        assert_eq!(key().to_string(), "S1_basic_analytic_8b");
        assert_eq!(key().item_id(), "S1");
        assert_eq!(key().asset_type(), "basic_analytic_8b");
    }

    #[test]
    fn test_fresh_ledger_is_unknown() {
        let ledger = Ledger::new();
        assert_eq!(ledger.record(&key()), AssetRecord::default());
    }

    #[test]
    fn test_activation_moves_forward() {
        let mut ledger = Ledger::new();
        assert!(ledger.mark_requested(&key()));
        assert_eq!(ledger.activation(&key()), Some(ActivationState::Requested));
        assert!(ledger.mark_active(&key()));
        assert_eq!(ledger.activation(&key()), Some(ActivationState::Active));
    }

    #[test]
    fn test_activation_never_regresses() {
        let mut ledger = Ledger::new();
        ledger.mark_active(&key());
        assert!(!ledger.mark_requested(&key()));
        assert_eq!(ledger.activation(&key()), Some(ActivationState::Active));
        assert!(!ledger.mark_active(&key()));
    }

    #[test]
    fn test_unknown_can_jump_to_active() {
        let mut ledger = Ledger::new();
        assert!(ledger.mark_active(&key()));
        assert_eq!(ledger.activation(&key()), Some(ActivationState::Active));
    }

    #[test]
    fn test_mark_downloaded_requires_active() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            ledger.mark_downloaded(&key()),
            Err(LedgerError::NotActive { .. })
        ));

        ledger.mark_requested(&key());
        assert!(ledger.mark_downloaded(&key()).is_err());

        ledger.mark_active(&key());
        assert!(ledger.mark_downloaded(&key()).unwrap());
        assert!(!ledger.mark_downloaded(&key()).unwrap());
        assert!(ledger.is_downloaded(&key()));
    }

    #[test]
    fn test_clear_downloaded_keeps_activation() {
        let mut ledger = Ledger::new();
        ledger.mark_active(&key());
        ledger.mark_downloaded(&key()).unwrap();

        assert!(ledger.clear_downloaded(&key()));
        assert!(!ledger.is_downloaded(&key()));
        assert_eq!(ledger.activation(&key()), Some(ActivationState::Active));
        assert!(!ledger.clear_downloaded(&key()));
    }

    #[test]
    fn test_wire_format() {
        let mut ledger = Ledger::new();
        ledger.mark_requested(&key());
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "activated_scenes": {"S1_basic_analytic_8b": "activating"},
                "downloaded_scenes": {}
            })
        );

        ledger.mark_active(&key());
        ledger.mark_downloaded(&key()).unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json["activated_scenes"]["S1_basic_analytic_8b"], "active");
        assert_eq!(json["downloaded_scenes"]["S1_basic_analytic_8b"], true);
    }

    #[test]
    fn test_reads_legacy_file_with_missing_section() {
        let ledger: Ledger =
            serde_json::from_str(r#"{"activated_scenes": {"A_ortho_visual": "active"}}"#)
                .unwrap();
        let key = AssetKey::new("A", "ortho_visual");
        assert_eq!(ledger.activation(&key), Some(ActivationState::Active));
        assert!(!ledger.is_downloaded(&key));
    }

    #[test]
    fn test_summary() {
        let mut ledger = Ledger::new();
        let a = AssetKey::new("A", "ortho_visual");
        let b = AssetKey::new("B", "ortho_visual");
        ledger.mark_requested(&a);
        ledger.mark_active(&b);
        ledger.mark_downloaded(&b).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.activated.len(), 2);
        assert_eq!(summary.active_count(), 1);
        assert_eq!(summary.downloaded, vec!["B_ortho_visual".to_string()]);
    }
}
