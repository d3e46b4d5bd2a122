use thiserror::Error;

use crate::filter::FilterScope;
use crate::sort::SortStrategy;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A sort strategy was requested for a scope it does not declare. This is
    /// a caller defect, never a data condition, and is raised immediately.
    #[error("sort strategy {strategy:?} does not apply to scope {scope:?}")]
    SortScopeMismatch {
        strategy: SortStrategy,
        scope: FilterScope,
    },

    /// A feature-scoped derivation was requested while no collection is active.
    #[error("no active collection for feature-scoped operation")]
    NoActiveCollection,

    /// Navigation below `Overview` or beyond `FeatureDetail`.
    #[error("navigation rejected: {0}")]
    NavigationRejected(&'static str),
}
