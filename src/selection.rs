use tracing::debug;

use crate::model::{
    FeatureCollection, FeatureRef, Initiator, Origin, SelectionEntry, USER_SELECTION_SOURCE_ID,
};

/// Caption of the synthesized selection collection.
const VIRTUAL_CAPTION: &str = "Selected results";

/// Tracks feature selections across the lifetime of a search-panel session.
///
/// Entries are unique by feature ref and kept in insertion order. The virtual
/// "selected" collection is derived on every read, never stored.
#[derive(Debug, Default)]
pub struct SelectionManager {
    entries: Vec<SelectionEntry>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, feature_ref: &FeatureRef) -> bool {
        self.entries.iter().any(|e| &e.feature_ref == feature_ref)
    }

    /// Append an entry. No-op (returns false) if the ref is already selected,
    /// regardless of initiator or display fields.
    pub fn add(
        &mut self,
        feature_ref: FeatureRef,
        display_fields: Vec<String>,
        initiator: Initiator,
    ) -> bool {
        if self.contains(&feature_ref) {
            debug!(?feature_ref, "selection add: already present");
            return false;
        }
        self.entries
            .push(SelectionEntry::new(feature_ref, display_fields, initiator));
        true
    }

    /// Exact removal by feature ref. No-op (returns false) if absent.
    pub fn remove(&mut self, feature_ref: &FeatureRef) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.feature_ref != feature_ref);
        self.entries.len() != before
    }

    /// Remove every entry for a source, except explicit stars, which survive
    /// navigating away. Returns the number of entries removed.
    pub fn clear_for_source(&mut self, source_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.feature_ref.source_id != source_id || e.initiator == Initiator::UserStar);
        before - self.entries.len()
    }

    pub fn clear_all(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        true
    }

    /// Synthesize the virtual selection collection by resolving each entry
    /// against the live collections. Entries whose referenced feature no
    /// longer exists are silently dropped, never raised as an error. The
    /// synthesized collection never resolves against a previous synthesis of
    /// itself.
    pub fn as_virtual_collection(&self, live: &[FeatureCollection]) -> FeatureCollection {
        let mut features = Vec::new();
        for entry in &self.entries {
            let resolved = live
                .iter()
                .filter(|c| c.origin != Origin::UserSelection)
                .find(|c| c.source_id == entry.feature_ref.source_id)
                .and_then(|c| c.find_feature(&entry.feature_ref.feature_id));
            match resolved {
                Some(feature) => features.push(feature.clone()),
                None => {
                    debug!(feature_ref = ?entry.feature_ref, "stale selection ref dropped");
                }
            }
        }
        FeatureCollection {
            source_id: USER_SELECTION_SOURCE_ID.to_string(),
            caption: VIRTUAL_CAPTION.to_string(),
            origin: Origin::UserSelection,
            on_click_override: None,
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Feature;

    fn live() -> Vec<FeatureCollection> {
        vec![
            FeatureCollection::new("parks", "Parks").with_features(vec![
                Feature::new("f1", "Central Park", "parks"),
                Feature::new("f2", "Hyde Park", "parks"),
            ]),
            FeatureCollection::new("roads", "Roads")
                .with_features(vec![Feature::new("r1", "High Street", "roads")]),
        ]
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut sel = SelectionManager::new();
        assert!(sel.add(FeatureRef::new("parks", "f1"), vec![], Initiator::ListClick));
        assert!(!sel.add(FeatureRef::new("parks", "f1"), vec![], Initiator::UserStar));
        assert_eq!(sel.entries().len(), 1);
        // The original initiator is kept.
        assert_eq!(sel.entries()[0].initiator, Initiator::ListClick);
    }

    #[test]
    fn test_add_then_remove_is_empty() {
        let mut sel = SelectionManager::new();
        sel.add(FeatureRef::new("parks", "f1"), vec![], Initiator::ListClick);
        assert!(sel.remove(&FeatureRef::new("parks", "f1")));
        assert!(sel.is_empty());
        assert!(!sel.remove(&FeatureRef::new("parks", "f1")));
    }

    #[test]
    fn test_stars_survive_clear_for_source() {
        let mut sel = SelectionManager::new();
        sel.add(FeatureRef::new("parks", "f1"), vec![], Initiator::UserStar);
        sel.add(FeatureRef::new("parks", "f2"), vec![], Initiator::ListClick);
        sel.add(FeatureRef::new("roads", "r1"), vec![], Initiator::MapClick);

        let removed = sel.clear_for_source("parks");
        assert_eq!(removed, 1);
        assert!(sel.contains(&FeatureRef::new("parks", "f1")));
        assert!(!sel.contains(&FeatureRef::new("parks", "f2")));
        // Other sources untouched.
        assert!(sel.contains(&FeatureRef::new("roads", "r1")));
    }

    #[test]
    fn test_virtual_collection_resolves_live_features() {
        let mut sel = SelectionManager::new();
        sel.add(FeatureRef::new("parks", "f2"), vec!["title".into()], Initiator::ListClick);
        sel.add(FeatureRef::new("roads", "r1"), vec![], Initiator::UserStar);

        let virtual_col = sel.as_virtual_collection(&live());
        assert_eq!(virtual_col.source_id, USER_SELECTION_SOURCE_ID);
        assert_eq!(virtual_col.origin, Origin::UserSelection);
        let titles: Vec<&str> = virtual_col.features.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Hyde Park", "High Street"]);
    }

    #[test]
    fn test_stale_refs_dropped_silently() {
        let mut sel = SelectionManager::new();
        sel.add(FeatureRef::new("parks", "gone"), vec![], Initiator::UserStar);
        sel.add(FeatureRef::new("rivers", "f1"), vec![], Initiator::ListClick);
        sel.add(FeatureRef::new("parks", "f1"), vec![], Initiator::ListClick);

        let virtual_col = sel.as_virtual_collection(&live());
        assert_eq!(virtual_col.features.len(), 1);
        assert_eq!(virtual_col.features[0].id, "f1");
        // Stale entries stay in the manager; only the synthesis drops them.
        assert_eq!(sel.entries().len(), 3);
    }

    #[test]
    fn test_virtual_collection_never_resolves_against_itself() {
        let mut sel = SelectionManager::new();
        sel.add(FeatureRef::new(USER_SELECTION_SOURCE_ID, "f1"), vec![], Initiator::ListClick);

        let mut collections = live();
        collections.push(sel.as_virtual_collection(&live()));
        let virtual_col = sel.as_virtual_collection(&collections);
        assert!(virtual_col.features.is_empty());
    }
}
