//! Search-result aggregation, filtering, selection and viewport-sync engine
//! for a map-search panel.
//!
//! The engine owns no rendering, networking or geometry: result sets come in
//! whole from external search providers, and viewport coordination happens
//! through a small set of typed, fire-and-forget notifications.

pub mod aggregate;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod selection;
pub mod sort;
pub mod view;


pub use aggregate::{ResultAggregator, SearchStatus};
pub use bridge::{SyncBridge, ViewportCommand};
pub use config::PanelConfig;
pub use engine::SearchPanel;
pub use error::EngineError;
pub use filter::{FilterApplied, FilterDebouncer, FilterScope, FilterState};
pub use model::{
    Feature, FeatureCollection, FeatureRef, Initiator, Origin, SelectionEntry,
    USER_SELECTION_SOURCE_ID,
};
pub use selection::SelectionManager;
pub use sort::SortStrategy;
pub use view::{ViewFrame, ViewState, ViewStateController};
