use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Default delay between the last keystroke and filter application.
pub const DEBOUNCE_DELAY_MS: u64 = 300;

/// Which level of the result hierarchy a filter (or sort) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterScope {
    Collections,
    Features,
}

/// Filter text per scope. The active scope itself is derived from the view
/// state, not stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    collections_text: String,
    features_text: String,
}

impl FilterState {
    pub fn text_for(&self, scope: FilterScope) -> &str {
        match scope {
            FilterScope::Collections => &self.collections_text,
            FilterScope::Features => &self.features_text,
        }
    }

    pub fn set_text(&mut self, scope: FilterScope, text: impl Into<String>) {
        match scope {
            FilterScope::Collections => self.collections_text = text.into(),
            FilterScope::Features => self.features_text = text.into(),
        }
    }

    /// Entering a scope starts with an empty filter.
    pub fn reset_scope(&mut self, scope: FilterScope) {
        self.set_text(scope, "");
    }

    pub fn clear_all(&mut self) {
        self.collections_text.clear();
        self.features_text.clear();
    }
}

/// Case-insensitive substring test. An empty (or whitespace-only) filter
/// matches everything.
pub fn matches(candidate: &str, filter: &str) -> bool {
    let filter = filter.trim();
    if filter.is_empty() {
        return true;
    }
    candidate.to_lowercase().contains(&filter.to_lowercase())
}

/// A filter application that survived its debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterApplied {
    pub scope: FilterScope,
    pub text: String,
}

/// Cancel-and-reschedule debounce for filter keystrokes.
///
/// Each call to [`schedule`](Self::schedule) aborts the previously scheduled
/// application; only the last-scheduled one ever delivers a [`FilterApplied`]
/// on the paired receiver. Superseded applications are cancelled, never fired.
#[derive(Debug)]
pub struct FilterDebouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<FilterApplied>,
    pending: Option<JoinHandle<()>>,
}

impl FilterDebouncer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FilterApplied>) {
        Self::with_delay(Duration::from_millis(DEBOUNCE_DELAY_MS))
    }

    pub fn with_delay(delay: Duration) -> (Self, mpsc::UnboundedReceiver<FilterApplied>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                tx,
                pending: None,
            },
            rx,
        )
    }

    /// Schedule a filter application, superseding any pending one.
    pub fn schedule(&mut self, scope: FilterScope, text: impl Into<String>) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let tx = self.tx.clone();
        let delay = self.delay;
        let applied = FilterApplied {
            scope,
            text: text.into(),
        };
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            debug!(scope = ?applied.scope, text = %applied.text, "debounced filter applied");
            // Receiver may be gone when the panel shuts down; best effort.
            let _ = tx.send(applied);
        }));
    }

    /// Drop any pending application without replacing it.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches("Parks", ""));
        assert!(matches("", ""));
        assert!(matches("Parks", "   "));
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert!(matches("Central Park", "par"));
        assert!(matches("Central Park", "PARK"));
        assert!(matches("Central Park", " park "));
        assert!(!matches("Roads", "park"));
        assert!(!matches("", "park"));
    }

    #[test]
    fn test_filter_application_is_idempotent() {
        // Same text twice yields the same verdict for every candidate.
        let candidates = ["Parks", "Roads", "Rivers"];
        let first: Vec<bool> = candidates.iter().map(|c| matches(c, "r")).collect();
        let second: Vec<bool> = candidates.iter().map(|c| matches(c, "r")).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scope_reset() {
        let mut state = FilterState::default();
        state.set_text(FilterScope::Collections, "par");
        state.set_text(FilterScope::Features, "central");
        state.reset_scope(FilterScope::Features);
        assert_eq!(state.text_for(FilterScope::Collections), "par");
        assert_eq!(state.text_for(FilterScope::Features), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_scheduled_application_fires() {
        let (mut debouncer, mut rx) = FilterDebouncer::with_delay(Duration::from_millis(300));
        debouncer.schedule(FilterScope::Collections, "p");
        debouncer.schedule(FilterScope::Collections, "pa");
        debouncer.schedule(FilterScope::Collections, "par");

        let applied = rx.recv().await.expect("debounced application");
        assert_eq!(applied.text, "par");
        assert_eq!(applied.scope, FilterScope::Collections);

        // The superseded applications were cancelled, not deferred.
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_application() {
        let (mut debouncer, mut rx) = FilterDebouncer::with_delay(Duration::from_millis(300));
        debouncer.schedule(FilterScope::Features, "riv");
        debouncer.cancel();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
