use std::sync::Arc;
use std::sync::mpsc;

use tracing::{debug, info};

use crate::aggregate::{self, ResultAggregator, SearchStatus};
use crate::bridge::{SyncBridge, ViewportCommand};
use crate::config::PanelConfig;
use crate::error::EngineError;
use crate::filter::{FilterApplied, FilterScope, FilterState};
use crate::model::{
    Feature, FeatureCollection, FeatureRef, Initiator, SelectionEntry, USER_SELECTION_SOURCE_ID,
};
use crate::selection::SelectionManager;
use crate::sort::SortStrategy;
use crate::view::{ViewFrame, ViewState, ViewStateController};

/// Display fields attached to engine-driven selection entries.
const DEFAULT_DISPLAY_FIELDS: &[&str] = &["title"];

/// The search-panel engine: owns the aggregator, selection, view state and
/// sync bridge, and coordinates them per user event.
///
/// All operations run synchronously to completion on the caller's thread.
/// Outbound viewport notifications are fire-and-forget.
pub struct SearchPanel {
    config: PanelConfig,
    aggregator: ResultAggregator,
    selection: SelectionManager,
    controller: ViewStateController,
    bridge: SyncBridge,
    filter: FilterState,
    collection_sort: SortStrategy,
    feature_sort: SortStrategy,
}

impl SearchPanel {
    /// Create a panel plus the receiver the viewport glue drains.
    pub fn new(config: PanelConfig) -> (Self, mpsc::Receiver<ViewportCommand>) {
        let (bridge, rx) = SyncBridge::new();
        (Self::with_bridge(config, bridge), rx)
    }

    pub fn with_bridge(config: PanelConfig, bridge: SyncBridge) -> Self {
        let collection_sort = config.default_collection_sort;
        let feature_sort = config.default_feature_sort;
        Self {
            config,
            aggregator: ResultAggregator::new(),
            selection: SelectionManager::new(),
            controller: ViewStateController::new(),
            bridge,
            filter: FilterState::default(),
            collection_sort,
            feature_sort,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn status(&self) -> SearchStatus {
        self.aggregator.status()
    }

    pub fn view_state(&self) -> &ViewState {
        self.controller.state()
    }

    pub fn selection_entries(&self) -> &[SelectionEntry] {
        self.selection.entries()
    }

    pub fn filter_scope(&self) -> FilterScope {
        self.controller.state().filter_scope()
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text_for(self.filter_scope())
    }

    // ----- search lifecycle -------------------------------------------------

    /// Hand over the result sets of a new search execution. Clears the
    /// selection and navigation state of the previous session and resets the
    /// viewport highlight.
    pub fn new_search(&mut self, collections: Arc<Vec<FeatureCollection>>) {
        let replaced = self.aggregator.set_collections(collections);
        info!(replaced, status = ?self.aggregator.status(), "new search execution");
        self.controller.reset();
        self.filter.clear_all();
        if self.selection.clear_all() {
            self.bridge.notify_highlight(Vec::new());
        }
    }

    /// External "clear all" for the accumulated selection.
    pub fn clear_selection(&mut self) {
        if !self.config.allow_clear_selection {
            debug!("clear_selection: capability disabled");
            return;
        }
        if self.selection.clear_all() {
            self.bridge.notify_highlight(Vec::new());
        }
    }

    // ----- filtering and sorting -------------------------------------------

    /// Apply filter text to the scope derived from the current view. Hosts
    /// that debounce keystrokes feed the surviving application through
    /// [`apply_debounced`](Self::apply_debounced) instead.
    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        if !self.config.enable_filtering {
            debug!("set_filter_text: capability disabled");
            return;
        }
        let scope = self.filter_scope();
        self.filter.set_text(scope, text);
    }

    /// Apply a debounced filter application. Ignored when the view has moved
    /// to a different scope since the keystroke was scheduled.
    pub fn apply_debounced(&mut self, applied: FilterApplied) {
        if applied.scope != self.filter_scope() {
            debug!(scope = ?applied.scope, "debounced filter for stale scope ignored");
            return;
        }
        self.set_filter_text(applied.text);
    }

    pub fn set_collection_sort(&mut self, strategy: SortStrategy) -> Result<(), EngineError> {
        if !strategy.applies_to(FilterScope::Collections) {
            return Err(EngineError::SortScopeMismatch {
                strategy,
                scope: FilterScope::Collections,
            });
        }
        self.collection_sort = strategy;
        Ok(())
    }

    pub fn set_feature_sort(&mut self, strategy: SortStrategy) -> Result<(), EngineError> {
        if !strategy.applies_to(FilterScope::Features) {
            return Err(EngineError::SortScopeMismatch {
                strategy,
                scope: FilterScope::Features,
            });
        }
        self.feature_sort = strategy;
        Ok(())
    }

    // ----- visible derivations ---------------------------------------------

    /// The overview list: working-set collections plus, when enabled and
    /// non-empty, the synthesized selection collection; filtered by caption
    /// and ordered by the active collection sort.
    pub fn visible_collections(&self) -> Result<Vec<FeatureCollection>, EngineError> {
        let virtual_col = (self.config.include_selection_collection
            && !self.selection.is_empty())
        .then(|| {
            self.selection
                .as_virtual_collection(self.aggregator.collections())
        });

        let mut items: Vec<&FeatureCollection> = self.aggregator.collections().iter().collect();
        if let Some(col) = &virtual_col {
            items.push(col);
        }
        let visible = aggregate::visible_from(
            items,
            self.effective_filter(FilterScope::Collections),
            self.config.enable_sorting.then_some(self.collection_sort),
            self.config.hide_empty_collections,
        )?;
        Ok(visible.into_iter().cloned().collect())
    }

    /// The feature list of the active collection, filtered by title and
    /// ordered by the active feature sort.
    pub fn visible_features(&self) -> Result<Vec<Feature>, EngineError> {
        let Some(source_id) = self.controller.state().active_collection() else {
            return Err(EngineError::NoActiveCollection);
        };
        let filter_text = self.effective_filter(FilterScope::Features);
        let strategy = self.config.enable_sorting.then_some(self.feature_sort);

        let visible = if source_id == USER_SELECTION_SOURCE_ID {
            let virtual_col = self
                .selection
                .as_virtual_collection(self.aggregator.collections());
            aggregate::visible_features_of(&virtual_col, filter_text, strategy)?
                .into_iter()
                .cloned()
                .collect()
        } else {
            self.aggregator
                .visible_features(source_id, filter_text, strategy)?
                .into_iter()
                .cloned()
                .collect()
        };
        Ok(visible)
    }

    fn effective_filter(&self, scope: FilterScope) -> &str {
        if self.config.enable_filtering {
            self.filter.text_for(scope)
        } else {
            ""
        }
    }

    // ----- navigation ------------------------------------------------------

    /// Drill into a collection from the overview. A collection with a click
    /// override suppresses the transition and delegates handling out.
    pub fn open_collection(&mut self, source_id: &str) -> Result<(), EngineError> {
        let Some(collection) = self.lookup_collection(source_id) else {
            debug!(source_id, "open_collection: unknown source ignored");
            return Ok(());
        };
        if let Some(handler) = collection.on_click_override.clone() {
            debug!(source_id, handler = %handler, "open_collection delegated out");
            self.bridge.notify_delegate(handler, source_id, None);
            return Ok(());
        }

        self.controller.open_collection(source_id)?;
        self.filter.reset_scope(FilterScope::Features);
        // Entering the virtual selection collection must not clear the very
        // entries it displays.
        if source_id != USER_SELECTION_SOURCE_ID
            && self.drop_incidental_outside(Some(source_id))
        {
            self.bridge.notify_highlight(self.selection_snapshot());
        }
        Ok(())
    }

    /// Drill into a feature from its collection's detail view (a list click).
    pub fn open_feature(&mut self, source_id: &str, feature_id: &str) -> Result<(), EngineError> {
        let Some(feature) = self.resolve_feature(source_id, feature_id) else {
            debug!(source_id, feature_id, "open_feature: unknown feature ignored");
            return Ok(());
        };
        if let Some(handler) = feature.on_click_override.clone() {
            debug!(source_id, feature_id, handler = %handler, "open_feature delegated out");
            self.bridge
                .notify_delegate(handler, source_id, Some(feature_id.to_string()));
            return Ok(());
        }

        self.controller.open_feature(source_id, feature_id)?;
        self.enter_feature(feature, Initiator::ListClick);
        Ok(())
    }

    /// Pop one breadcrumb frame. At the overview this is a no-op.
    pub fn go_back(&mut self) {
        let Some(popped) = self.controller.go_back() else {
            return;
        };
        let selection_changed = match &popped {
            ViewFrame::FeatureDetail {
                source_id,
                feature_id,
            } => self.drop_incidental_entry(&FeatureRef::new(source_id, feature_id)),
            ViewFrame::CollectionDetail { source_id } => {
                // Back on the overview: the collections scope starts fresh.
                self.filter.reset_scope(FilterScope::Collections);
                self.selection.clear_for_source(source_id) > 0
            }
            ViewFrame::Overview => false,
        };
        if selection_changed {
            self.bridge.notify_highlight(self.selection_snapshot());
        }
    }

    /// Return to the overview root and clear the filters for both scopes.
    pub fn reset(&mut self) {
        let left_feature = self
            .controller
            .state()
            .active_feature()
            .map(|(s, f)| FeatureRef::new(s, f));
        self.controller.reset();
        self.filter.clear_all();
        if let Some(feature_ref) = left_feature
            && self.drop_incidental_entry(&feature_ref)
        {
            self.bridge.notify_highlight(self.selection_snapshot());
        }
    }

    /// Jump straight to a feature's detail view, bypassing the push sequence.
    /// Used when the trigger is an external viewport click.
    pub fn jump_to_feature(&mut self, source_id: &str, feature_id: &str) {
        let Some(feature) = self.resolve_feature(source_id, feature_id) else {
            debug!(source_id, feature_id, "jump_to_feature: unknown feature ignored");
            return;
        };
        let left_feature = self
            .controller
            .state()
            .active_feature()
            .map(|(s, f)| FeatureRef::new(s, f));

        self.controller.jump_to_feature(source_id, feature_id);
        self.filter.reset_scope(FilterScope::Features);
        if let Some(feature_ref) = left_feature {
            self.drop_incidental_entry(&feature_ref);
        }
        self.drop_incidental_outside(Some(source_id));
        self.enter_feature(feature, Initiator::MapClick);
    }

    /// Inbound viewport activation: locate the owner of the first id and jump
    /// to it. Unknown ids are ignored (the map may be showing stale state).
    pub fn on_external_feature_activated(&mut self, feature_ids: &[String]) {
        let Some(feature_id) = feature_ids.first() else {
            return;
        };
        let Some(source_id) = self
            .aggregator
            .owner_of_feature(feature_id)
            .map(|c| c.source_id.clone())
        else {
            debug!(feature_id = %feature_id, "external activation for unknown feature ignored");
            return;
        };
        self.jump_to_feature(&source_id, feature_id);
    }

    // ----- per-feature capabilities ----------------------------------------

    /// Explicitly star or unstar a feature.
    pub fn toggle_star(&mut self, source_id: &str, feature_id: &str) {
        if !self.config.enable_feature_toggle {
            debug!("toggle_star: capability disabled");
            return;
        }
        let feature_ref = FeatureRef::new(source_id, feature_id);
        let changed = if self.selection.contains(&feature_ref) {
            self.selection.remove(&feature_ref)
        } else {
            if self.resolve_feature(source_id, feature_id).is_none() {
                debug!(source_id, feature_id, "toggle_star: unknown feature ignored");
                return;
            }
            self.selection
                .add(feature_ref, default_display_fields(), Initiator::UserStar)
        };
        if changed {
            self.bridge.notify_highlight(self.selection_snapshot());
        }
    }

    /// Transient hover preview. Touches neither selection nor view state.
    pub fn hover_feature(&self, source_id: &str, feature_id: &str) {
        if !self.config.enable_hover_preview {
            return;
        }
        if let Some(feature) = self.resolve_feature(source_id, feature_id) {
            self.bridge.notify_preview(feature);
        }
    }

    /// Hand the currently visible (filtered, sorted) collections to the
    /// external exporter.
    pub fn request_download(&mut self) -> Result<(), EngineError> {
        if !self.config.enable_download {
            debug!("request_download: capability disabled");
            return Ok(());
        }
        let collections = match self.controller.state().active_collection() {
            None => self.visible_collections()?,
            Some(source_id) => {
                let source_id = source_id.to_string();
                let features = self.visible_features()?;
                let Some(collection) = self.lookup_collection(&source_id) else {
                    return Ok(());
                };
                vec![FeatureCollection {
                    features,
                    ..collection
                }]
            }
        };
        self.bridge.notify_download(collections);
        Ok(())
    }

    // ----- internals -------------------------------------------------------

    /// Selection bookkeeping plus sync-out for entering a feature: one
    /// highlight and one zoom, per transition.
    fn enter_feature(&mut self, feature: Feature, initiator: Initiator) {
        self.selection
            .add(feature.feature_ref(), default_display_fields(), initiator);
        self.bridge.notify_highlight(self.selection_snapshot());
        if feature.has_geometry {
            self.bridge.notify_zoom_to(vec![feature]);
        } else {
            self.bridge.notify_zoom_to(Vec::new());
        }
    }

    /// Remove one non-star entry. Returns whether the selection changed.
    fn drop_incidental_entry(&mut self, feature_ref: &FeatureRef) -> bool {
        let is_star = self
            .selection
            .entries()
            .iter()
            .any(|e| &e.feature_ref == feature_ref && e.initiator == Initiator::UserStar);
        if is_star {
            return false;
        }
        self.selection.remove(feature_ref)
    }

    /// Remove non-star entries whose source differs from `keep_source`.
    fn drop_incidental_outside(&mut self, keep_source: Option<&str>) -> bool {
        let sources: Vec<String> = self
            .selection
            .entries()
            .iter()
            .filter(|e| e.initiator != Initiator::UserStar)
            .map(|e| e.feature_ref.source_id.clone())
            .filter(|s| keep_source != Some(s.as_str()))
            .collect();
        let mut changed = false;
        for source in sources {
            changed |= self.selection.clear_for_source(&source) > 0;
        }
        changed
    }

    fn selection_snapshot(&self) -> Vec<SelectionEntry> {
        self.selection.entries().to_vec()
    }

    /// Look up a collection by source id, covering the virtual selection
    /// collection as well as the working set. Returns an owned clone since
    /// the virtual collection is synthesized on the fly.
    fn lookup_collection(&self, source_id: &str) -> Option<FeatureCollection> {
        if source_id == USER_SELECTION_SOURCE_ID {
            if !self.config.include_selection_collection {
                return None;
            }
            return Some(
                self.selection
                    .as_virtual_collection(self.aggregator.collections()),
            );
        }
        self.aggregator.find_collection(source_id).cloned()
    }

    fn resolve_feature(&self, source_id: &str, feature_id: &str) -> Option<Feature> {
        if source_id == USER_SELECTION_SOURCE_ID {
            return self
                .selection
                .as_virtual_collection(self.aggregator.collections())
                .find_feature(feature_id)
                .cloned();
        }
        self.aggregator
            .find_collection(source_id)?
            .find_feature(feature_id)
            .cloned()
    }
}

fn default_display_fields() -> Vec<String> {
    DEFAULT_DISPLAY_FIELDS.iter().map(|s| s.to_string()).collect()
}
