use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::filter;
use crate::model::{Feature, FeatureCollection};
use crate::sort::{self, SortStrategy};

/// Distinguishes "nothing searched yet" from "searched, zero hits".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    NotSearched,
    Empty,
    Results,
}

/// Owns the raw working set of feature collections for one search execution
/// and derives the visible (filtered + sorted) views from it.
///
/// Pure apart from the stored working set: the same inputs always yield the
/// same visible list, and no derivation ever mutates or regenerates feature
/// identity.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    collections: Option<Arc<Vec<FeatureCollection>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working set wholesale. Idempotent on the identical input
    /// by identity (`Arc` pointer), not deep equality. Returns whether the
    /// working set actually changed.
    pub fn set_collections(&mut self, collections: Arc<Vec<FeatureCollection>>) -> bool {
        if let Some(current) = &self.collections
            && Arc::ptr_eq(current, &collections)
        {
            debug!("set_collections: identical working set, no-op");
            return false;
        }
        debug!(count = collections.len(), "set_collections: working set replaced");
        self.collections = Some(collections);
        true
    }

    pub fn status(&self) -> SearchStatus {
        match &self.collections {
            None => SearchStatus::NotSearched,
            Some(cols) if cols.iter().all(|c| c.features.is_empty()) => SearchStatus::Empty,
            Some(_) => SearchStatus::Results,
        }
    }

    pub fn collections(&self) -> &[FeatureCollection] {
        self.collections.as_deref().map_or(&[], Vec::as_slice)
    }

    pub fn find_collection(&self, source_id: &str) -> Option<&FeatureCollection> {
        self.collections().iter().find(|c| c.source_id == source_id)
    }

    /// Locate the collection owning a feature id. Used for inbound viewport
    /// activations, which carry bare feature ids.
    pub fn owner_of_feature(&self, feature_id: &str) -> Option<&FeatureCollection> {
        self.collections()
            .iter()
            .find(|c| c.find_feature(feature_id).is_some())
    }

    /// Collection-scope visible list: caption filter, then the active
    /// collection-level sort strategy. `None` keeps the stored order (the
    /// sorting capability is switched off).
    pub fn visible_collections(
        &self,
        filter_text: &str,
        strategy: Option<SortStrategy>,
        hide_empty: bool,
    ) -> Result<Vec<&FeatureCollection>, EngineError> {
        visible_from(self.collections().iter().collect(), filter_text, strategy, hide_empty)
    }

    /// Feature-scope visible list for one collection: title filter, then the
    /// active feature-level sort strategy. Features with an empty title stay
    /// in the raw set but never appear here. An unknown source yields an
    /// empty list, since the caller may hold a stale source id.
    pub fn visible_features(
        &self,
        source_id: &str,
        filter_text: &str,
        strategy: Option<SortStrategy>,
    ) -> Result<Vec<&Feature>, EngineError> {
        let Some(collection) = self.find_collection(source_id) else {
            debug!(source_id, "visible_features: unknown source");
            return Ok(Vec::new());
        };
        visible_features_of(collection, filter_text, strategy)
    }
}

/// Feature-scope derivation over one collection, independent of the working
/// set. The engine uses this for the synthesized selection collection too.
pub fn visible_features_of<'a>(
    collection: &'a FeatureCollection,
    filter_text: &str,
    strategy: Option<SortStrategy>,
) -> Result<Vec<&'a Feature>, EngineError> {
    let matching: Vec<&Feature> = collection
        .features
        .iter()
        .filter(|f| !f.title.is_empty() && filter::matches(&f.title, filter_text))
        .collect();
    match strategy {
        Some(strategy) => sort::sort_features(strategy, matching),
        None => Ok(matching),
    }
}

/// Filter and sort an arbitrary collection list. Split out so the engine can
/// run the same derivation over the working set plus the synthesized
/// selection collection.
pub fn visible_from<'a>(
    items: Vec<&'a FeatureCollection>,
    filter_text: &str,
    strategy: Option<SortStrategy>,
    hide_empty: bool,
) -> Result<Vec<&'a FeatureCollection>, EngineError> {
    let matching: Vec<&FeatureCollection> = items
        .into_iter()
        .filter(|c| filter::matches(&c.caption, filter_text))
        .filter(|c| !hide_empty || !c.features.is_empty())
        .collect();
    match strategy {
        Some(strategy) => sort::sort_collections(strategy, matching),
        None => Ok(matching),
    }
}
