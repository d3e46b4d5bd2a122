use std::sync::mpsc;

use tracing::debug;

use crate::model::{Feature, FeatureCollection, SelectionEntry};

/// The closed set of typed outbound notifications the engine sends to the
/// external viewport and exporter. Replaces the original's string-keyed event
/// bus so the contract is checkable at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportCommand {
    /// Re-highlight the given selection snapshot.
    Highlight { selection: Vec<SelectionEntry> },
    /// Zoom the viewport to one or more features.
    ZoomTo { features: Vec<Feature> },
    /// A collection or feature click whose handling is delegated to an
    /// externally named handler.
    Delegate {
        handler: String,
        source_id: String,
        feature_id: Option<String>,
    },
    /// Transient hover preview of a single feature; never part of the
    /// selection.
    Preview { feature: Feature },
    /// Export of the currently visible collections was requested.
    DownloadRequested { collections: Vec<FeatureCollection> },
}

/// Outbound half of the viewport coordination. All notifications are
/// fire-and-forget: the engine never waits for or depends on a response, and
/// a vanished receiver is logged, not raised.
///
/// Inbound viewport events enter through
/// [`SearchPanel::on_external_feature_activated`](crate::engine::SearchPanel::on_external_feature_activated),
/// which drives the view state machine with the same bookkeeping as a list
/// click.
#[derive(Debug)]
pub struct SyncBridge {
    tx: mpsc::Sender<ViewportCommand>,
}

impl SyncBridge {
    /// Create a bridge plus the receiving end the viewport glue drains.
    pub fn new() -> (Self, mpsc::Receiver<ViewportCommand>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Attach to an existing channel.
    pub fn attached(tx: mpsc::Sender<ViewportCommand>) -> Self {
        Self { tx }
    }

    pub fn notify_highlight(&self, selection: Vec<SelectionEntry>) {
        self.send(ViewportCommand::Highlight { selection });
    }

    pub fn notify_zoom_to(&self, features: Vec<Feature>) {
        self.send(ViewportCommand::ZoomTo { features });
    }

    pub fn notify_delegate(
        &self,
        handler: impl Into<String>,
        source_id: impl Into<String>,
        feature_id: Option<String>,
    ) {
        self.send(ViewportCommand::Delegate {
            handler: handler.into(),
            source_id: source_id.into(),
            feature_id,
        });
    }

    pub fn notify_preview(&self, feature: Feature) {
        self.send(ViewportCommand::Preview { feature });
    }

    pub fn notify_download(&self, collections: Vec<FeatureCollection>) {
        self.send(ViewportCommand::DownloadRequested { collections });
    }

    fn send(&self, command: ViewportCommand) {
        if self.tx.send(command).is_err() {
            debug!("viewport receiver dropped; notification discarded");
        }
    }
}
