use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::filter::FilterScope;
use crate::model::{Feature, FeatureCollection};

/// Named comparison strategies. Each strategy declares which scope(s) it
/// applies to; requesting it outside that scope is a caller defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortStrategy {
    /// Ascending by caption/title, case-insensitive.
    AtoZ,
    /// Exact mirror image of `AtoZ`, including the ordering of equal keys.
    ZtoA,
    /// Collections only: descending by reported total-feature count, ties in
    /// `AtoZ` order.
    NumHits,
}

impl SortStrategy {
    pub fn applies_to(self, scope: FilterScope) -> bool {
        match self {
            Self::AtoZ | Self::ZtoA => true,
            Self::NumHits => scope == FilterScope::Collections,
        }
    }

    fn ensure_scope(self, scope: FilterScope) -> Result<(), EngineError> {
        if self.applies_to(scope) {
            Ok(())
        } else {
            Err(EngineError::SortScopeMismatch {
                strategy: self,
                scope,
            })
        }
    }
}

/// Case-insensitive comparison with the original string as tie-break, so keys
/// that differ only in case still order deterministically.
fn name_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort collections by caption (or hit count). The sort is stable; `ZtoA` is
/// defined as `reverse(AtoZ)`, not an independent descending comparator.
pub fn sort_collections<'a>(
    strategy: SortStrategy,
    mut items: Vec<&'a FeatureCollection>,
) -> Result<Vec<&'a FeatureCollection>, EngineError> {
    strategy.ensure_scope(FilterScope::Collections)?;
    match strategy {
        SortStrategy::AtoZ => {
            items.sort_by(|a, b| name_cmp(&a.caption, &b.caption));
        }
        SortStrategy::ZtoA => {
            items.sort_by(|a, b| name_cmp(&a.caption, &b.caption));
            items.reverse();
        }
        SortStrategy::NumHits => {
            // AtoZ first so that equal hit counts keep alphabetical order
            // under the subsequent stable sort.
            items.sort_by(|a, b| name_cmp(&a.caption, &b.caption));
            items.sort_by(|a, b| b.total_hits().cmp(&a.total_hits()));
        }
    }
    Ok(items)
}

/// Sort features by title. Same stability and mirror guarantees as
/// [`sort_collections`].
pub fn sort_features<'a>(
    strategy: SortStrategy,
    mut items: Vec<&'a Feature>,
) -> Result<Vec<&'a Feature>, EngineError> {
    strategy.ensure_scope(FilterScope::Features)?;
    match strategy {
        SortStrategy::AtoZ => {
            items.sort_by(|a, b| name_cmp(&a.title, &b.title));
        }
        SortStrategy::ZtoA => {
            items.sort_by(|a, b| name_cmp(&a.title, &b.title));
            items.reverse();
        }
        SortStrategy::NumHits => unreachable!("rejected by ensure_scope"),
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(source_id: &str, caption: &str, hits: usize) -> FeatureCollection {
        let features = (0..hits)
            .map(|i| Feature::new(format!("f{i}"), format!("Feature {i}"), source_id))
            .collect();
        FeatureCollection::new(source_id, caption).with_features(features)
    }

    fn captions(items: &[&FeatureCollection]) -> Vec<String> {
        items.iter().map(|c| c.caption.clone()).collect()
    }

    #[test]
    fn test_a_to_z_is_case_insensitive() {
        let a = collection("a", "roads", 0);
        let b = collection("b", "Parks", 0);
        let c = collection("c", "Rivers", 0);
        let sorted = sort_collections(SortStrategy::AtoZ, vec![&a, &b, &c]).unwrap();
        assert_eq!(captions(&sorted), vec!["Parks", "Rivers", "roads"]);
    }

    #[test]
    fn test_z_to_a_mirrors_a_to_z_including_ties() {
        // Two collections with identical captions: the mirror image must hold
        // even for equal keys, which an independent descending sort would not
        // guarantee.
        let a = collection("a", "Parks", 1);
        let b = collection("b", "Parks", 2);
        let c = collection("c", "Roads", 0);
        let input = vec![&c, &a, &b];

        let ascending = sort_collections(SortStrategy::AtoZ, input.clone()).unwrap();
        let mut mirrored = ascending.clone();
        mirrored.reverse();
        let descending = sort_collections(SortStrategy::ZtoA, input).unwrap();

        let ids = |items: &[&FeatureCollection]| {
            items.iter().map(|c| c.source_id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&descending), ids(&mirrored));
    }

    #[test]
    fn test_num_hits_descending_with_alphabetical_ties() {
        let a = collection("a", "Roads", 2);
        let b = collection("b", "Parks", 2);
        let c = collection("c", "Rivers", 5);
        let sorted = sort_collections(SortStrategy::NumHits, vec![&a, &b, &c]).unwrap();
        assert_eq!(captions(&sorted), vec!["Rivers", "Parks", "Roads"]);
    }

    #[test]
    fn test_num_hits_rejected_for_features() {
        let f = Feature::new("f1", "Central Park", "parks");
        let err = sort_features(SortStrategy::NumHits, vec![&f]).unwrap_err();
        assert_eq!(
            err,
            EngineError::SortScopeMismatch {
                strategy: SortStrategy::NumHits,
                scope: FilterScope::Features,
            }
        );
    }

    #[test]
    fn test_feature_sort_by_title() {
        let a = Feature::new("f1", "hyde park", "parks");
        let b = Feature::new("f2", "Central Park", "parks");
        let sorted = sort_features(SortStrategy::AtoZ, vec![&a, &b]).unwrap();
        assert_eq!(sorted[0].id, "f2");
        let sorted = sort_features(SortStrategy::ZtoA, vec![&a, &b]).unwrap();
        assert_eq!(sorted[0].id, "f1");
    }
}
