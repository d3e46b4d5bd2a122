use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::filter::FilterScope;

/// One breadcrumb frame. The stack bottom is always `Overview`; the pair of
/// detail frames above it mirror the drill-down path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum ViewFrame {
    Overview,
    CollectionDetail {
        source_id: String,
    },
    FeatureDetail {
        source_id: String,
        feature_id: String,
    },
}

/// Maximum breadcrumb depth: Overview, CollectionDetail, FeatureDetail.
pub const MAX_DEPTH: usize = 3;

/// The breadcrumb stack. Never empty, bottom always `Overview`, bounded by
/// [`MAX_DEPTH`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    stack: Vec<ViewFrame>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            stack: vec![ViewFrame::Overview],
        }
    }
}

impl ViewState {
    pub fn current(&self) -> &ViewFrame {
        self.stack.last().expect("stack is never empty")
    }

    pub fn stack(&self) -> &[ViewFrame] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Source id of the collection the user is currently inside, if any.
    pub fn active_collection(&self) -> Option<&str> {
        match self.current() {
            ViewFrame::Overview => None,
            ViewFrame::CollectionDetail { source_id }
            | ViewFrame::FeatureDetail { source_id, .. } => Some(source_id),
        }
    }

    /// The feature currently displayed in detail, if any.
    pub fn active_feature(&self) -> Option<(&str, &str)> {
        match self.current() {
            ViewFrame::FeatureDetail {
                source_id,
                feature_id,
            } => Some((source_id, feature_id)),
            _ => None,
        }
    }

    /// Filter scope is derived from the view: feature-scoped inside a
    /// collection, collection-scoped on the overview.
    pub fn filter_scope(&self) -> FilterScope {
        match self.current() {
            ViewFrame::Overview => FilterScope::Collections,
            _ => FilterScope::Features,
        }
    }
}

/// Breadcrumb state machine: the single owner of "what is currently
/// displayed". Pure stack transitions; selection bookkeeping and viewport
/// sync-out happen in the engine around these calls.
#[derive(Debug, Default)]
pub struct ViewStateController {
    state: ViewState,
}

impl ViewStateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Push `CollectionDetail`. Only legal from `Overview`.
    pub fn open_collection(&mut self, source_id: impl Into<String>) -> Result<(), EngineError> {
        if self.state.current() != &ViewFrame::Overview {
            return Err(EngineError::NavigationRejected(
                "open_collection is only legal from the overview",
            ));
        }
        self.state.stack.push(ViewFrame::CollectionDetail {
            source_id: source_id.into(),
        });
        Ok(())
    }

    /// Push `FeatureDetail`. Only legal from `CollectionDetail` of the same
    /// source; pushing beyond feature detail is rejected.
    pub fn open_feature(
        &mut self,
        source_id: &str,
        feature_id: impl Into<String>,
    ) -> Result<(), EngineError> {
        match self.state.current() {
            ViewFrame::CollectionDetail { source_id: active } if active == source_id => {
                self.state.stack.push(ViewFrame::FeatureDetail {
                    source_id: source_id.to_string(),
                    feature_id: feature_id.into(),
                });
                Ok(())
            }
            ViewFrame::FeatureDetail { .. } => Err(EngineError::NavigationRejected(
                "already at feature detail",
            )),
            _ => Err(EngineError::NavigationRejected(
                "open_feature requires the owning collection to be active",
            )),
        }
    }

    /// Pop exactly one frame. Popping below `Overview` is a no-op; the popped
    /// frame is returned when one was removed.
    pub fn go_back(&mut self) -> Option<ViewFrame> {
        if self.state.stack.len() <= 1 {
            debug!("go_back at overview: no-op");
            return None;
        }
        self.state.stack.pop()
    }

    /// Replace the whole stack with the drill-down path to one feature, in a
    /// single step. Used for inbound viewport activations.
    pub fn jump_to_feature(&mut self, source_id: &str, feature_id: &str) {
        self.state.stack = vec![
            ViewFrame::Overview,
            ViewFrame::CollectionDetail {
                source_id: source_id.to_string(),
            },
            ViewFrame::FeatureDetail {
                source_id: source_id.to_string(),
                feature_id: feature_id.to_string(),
            },
        ];
    }

    /// Return to the overview root.
    pub fn reset(&mut self) {
        self.state = ViewState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_overview() {
        let ctl = ViewStateController::new();
        assert_eq!(ctl.state().current(), &ViewFrame::Overview);
        assert_eq!(ctl.state().depth(), 1);
        assert_eq!(ctl.state().filter_scope(), FilterScope::Collections);
    }

    #[test]
    fn test_breadcrumb_reversibility() {
        let mut ctl = ViewStateController::new();
        ctl.open_collection("parks").unwrap();
        ctl.open_feature("parks", "f1").unwrap();
        assert_eq!(ctl.state().depth(), 3);

        ctl.go_back();
        ctl.go_back();
        assert_eq!(ctl.state().current(), &ViewFrame::Overview);
        assert_eq!(ctl.state().depth(), 1);
    }

    #[test]
    fn test_go_back_floor_is_a_no_op() {
        let mut ctl = ViewStateController::new();
        assert!(ctl.go_back().is_none());
        assert_eq!(ctl.state().current(), &ViewFrame::Overview);
    }

    #[test]
    fn test_push_beyond_feature_detail_is_rejected() {
        let mut ctl = ViewStateController::new();
        ctl.open_collection("parks").unwrap();
        ctl.open_feature("parks", "f1").unwrap();
        let err = ctl.open_feature("parks", "f2").unwrap_err();
        assert!(matches!(err, EngineError::NavigationRejected(_)));
        assert_eq!(ctl.state().depth(), 3);
    }

    #[test]
    fn test_open_feature_requires_matching_collection() {
        let mut ctl = ViewStateController::new();
        ctl.open_collection("parks").unwrap();
        assert!(ctl.open_feature("roads", "r1").is_err());
    }

    #[test]
    fn test_open_collection_requires_overview() {
        let mut ctl = ViewStateController::new();
        ctl.open_collection("parks").unwrap();
        assert!(ctl.open_collection("roads").is_err());
    }

    #[test]
    fn test_jump_to_feature_builds_full_stack() {
        let mut ctl = ViewStateController::new();
        ctl.jump_to_feature("parks", "f2");
        assert_eq!(
            ctl.state().stack(),
            &[
                ViewFrame::Overview,
                ViewFrame::CollectionDetail {
                    source_id: "parks".into()
                },
                ViewFrame::FeatureDetail {
                    source_id: "parks".into(),
                    feature_id: "f2".into()
                },
            ]
        );
        assert_eq!(ctl.state().active_feature(), Some(("parks", "f2")));
    }

    #[test]
    fn test_jump_replaces_existing_stack() {
        let mut ctl = ViewStateController::new();
        ctl.open_collection("roads").unwrap();
        ctl.jump_to_feature("parks", "f1");
        assert_eq!(ctl.state().depth(), 3);
        assert_eq!(ctl.state().active_collection(), Some("parks"));
    }

    #[test]
    fn test_reset_returns_to_overview() {
        let mut ctl = ViewStateController::new();
        ctl.jump_to_feature("parks", "f1");
        ctl.reset();
        assert_eq!(ctl.state(), &ViewState::default());
    }

    #[test]
    fn test_view_state_serde_round_trip() {
        let mut ctl = ViewStateController::new();
        ctl.jump_to_feature("parks", "f1");
        let json = serde_json::to_string(ctl.state()).expect("serialize view state");
        let back: ViewState = serde_json::from_str(&json).expect("deserialize view state");
        assert_eq!(&back, ctl.state());
    }
}
