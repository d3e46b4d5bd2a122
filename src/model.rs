use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved `source_id` of the synthesized selection collection.
pub const USER_SELECTION_SOURCE_ID: &str = "userSelected";

/// Distinguishes provider-sourced, user-accumulated and externally-overridden
/// collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    Normal,
    UserSelection,
    External,
}

/// One addressable result within a collection.
///
/// `id` is unique within the owning collection only; cross-collection identity
/// is the `(source_id, id)` pair, see [`FeatureRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub title: String,
    pub has_geometry: bool,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    pub source_id: String,
    /// Name of an external click handler. When set, activating this feature is
    /// delegated out instead of opening its detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click_override: Option<String>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            has_geometry: true,
            properties: HashMap::new(),
            source_id: source_id.into(),
            on_click_override: None,
        }
    }

    /// Stable cross-collection identity of this feature.
    pub fn feature_ref(&self) -> FeatureRef {
        FeatureRef {
            source_id: self.source_id.clone(),
            feature_id: self.id.clone(),
        }
    }
}

/// One search provider's result set for a single search execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub source_id: String,
    pub caption: String,
    pub origin: Origin,
    /// Name of an external click handler. When set, opening this collection is
    /// delegated out instead of pushing a detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click_override: Option<String>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(source_id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            caption: caption.into(),
            origin: Origin::Normal,
            on_click_override: None,
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    /// Reported total-feature count, used by the hit-count sort strategy.
    pub fn total_hits(&self) -> usize {
        self.features.len()
    }

    pub fn find_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == feature_id)
    }
}

/// Cross-collection feature identity: the `(source_id, feature_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRef {
    pub source_id: String,
    pub feature_id: String,
}

impl FeatureRef {
    pub fn new(source_id: impl Into<String>, feature_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            feature_id: feature_id.into(),
        }
    }
}

/// Why a selection entry exists. Explicit stars outlive incidental
/// "viewing details" selections when a source's entries are cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiator {
    MapClick,
    ListClick,
    UserStar,
}

/// One accumulated selection. Unique by `feature_ref` within the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub feature_ref: FeatureRef,
    pub display_fields: Vec<String>,
    pub initiator: Initiator,
    pub selected_at: DateTime<Utc>,
}

impl SelectionEntry {
    pub fn new(feature_ref: FeatureRef, display_fields: Vec<String>, initiator: Initiator) -> Self {
        Self {
            feature_ref,
            display_fields,
            initiator,
            selected_at: Utc::now(),
        }
    }
}
