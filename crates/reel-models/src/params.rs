//! Template parameters and their persisted snapshot.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Identifier of a stored media asset (image or sound).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters accepted by every template.
///
/// The declared schema for a template descriptor is generated from this type
/// via `schemars`; submission-time validation uses the `validator` derives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct TemplateParams {
    /// Video title, also drawn as the opening caption
    #[validate(length(min = 1, max = 120))]
    pub title: String,

    /// Background image asset
    pub background: AssetId,

    /// Background music asset (optional; silence when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgm: Option<AssetId>,

    /// Voice preset for speech synthesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Opening narration block
    #[validate(nested)]
    pub opening: Opening,

    /// Content scenes, rendered in declared order
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub scenes: Vec<Scene>,
}

/// Opening narration unit, optionally backed by a pan/zoom image.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Opening {
    #[validate(length(min = 1))]
    pub narration: String,

    /// Full-frame opening image (slow pan/zoom when present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<AssetId>,
}

/// One structured content unit: images plus one narration text block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Scene {
    #[validate(length(min = 1))]
    pub narration: String,

    /// Scene images, shown in order with entrance animations
    #[serde(default)]
    pub images: Vec<AssetId>,

    /// Caption overlay for the scene
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Player-comparison data card (used by the compare template)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub compare: Option<CompareCard>,
}

/// Two-player comparison card with stat rows.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CompareCard {
    pub left: PlayerPanel,
    pub right: PlayerPanel,

    #[validate(length(min = 1))]
    pub rows: Vec<StatRow>,
}

/// One player's bottom data panel.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlayerPanel {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<AssetId>,

    /// Draft line, e.g. "2018 R1 P3"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,

    /// Emphasised key metric, e.g. "27.1 PPG"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_metric: Option<String>,

    /// Secondary stat lines
    #[serde(default)]
    pub stats: Vec<String>,
}

/// One comparable stat row (label plus both players' values).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatRow {
    pub label: String,
    pub left: f64,
    pub right: f64,
}

/// Immutable snapshot of the raw request parameters for a job.
///
/// Persisted before rendering begins so a draft can be recreated even if
/// rendering fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSet {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub raw: serde_json::Value,
}

impl ParameterSet {
    /// Snapshot raw request parameters.
    pub fn snapshot(raw: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_params() -> serde_json::Value {
        json!({
            "title": "Rookie of the year",
            "background": "bg-01",
            "bgm": "bgm-chill",
            "opening": { "narration": "本赛季最佳新秀是谁？", "image": "img-open" },
            "scenes": [
                { "narration": "第一位候选人表现抢眼。", "images": ["img-1"], "caption": "候选人一" }
            ]
        })
    }

    #[test]
    fn test_params_roundtrip_and_validate() {
        let params: TemplateParams = serde_json::from_value(sample_params()).unwrap();
        assert!(params.validate().is_ok());
        assert_eq!(params.scenes.len(), 1);
        assert_eq!(params.background.as_str(), "bg-01");
    }

    #[test]
    fn test_empty_scenes_rejected() {
        let mut raw = sample_params();
        raw["scenes"] = json!([]);
        let params: TemplateParams = serde_json::from_value(raw).unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_parameter_set_snapshot_keeps_raw() {
        let raw = sample_params();
        let set = ParameterSet::snapshot(raw.clone());
        assert_eq!(set.raw, raw);
    }
}
