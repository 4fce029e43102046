use std::collections::BTreeSet;

use crate::accessors::matches_query;
use crate::scene::{Scene, SceneId};
use crate::status::StatusLedger;

/// Client-side view over the fetched scene collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryState {
    scenes: Vec<Scene>,
    loaded: bool,
    loading: bool,
    last_error: Option<String>,
    search_query: String,
    expanded: BTreeSet<SceneId>,
    ledger: StatusLedger,
}

impl HistoryState {
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn find(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Scenes matching the current search, in fetch order.
    pub fn filtered(&self) -> impl Iterator<Item = &Scene> + '_ {
        self.scenes
            .iter()
            .filter(move |scene| matches_query(scene, &self.search_query))
    }

    pub(crate) fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub(crate) fn apply_fetch(&mut self, scenes: Vec<Scene>) {
        self.scenes = self.ledger.reconcile(scenes);
        self.loaded = true;
        self.loading = false;
        self.last_error = None;
    }

    /// Keeps the previous collection on screen, like a placeholder.
    pub(crate) fn apply_fetch_error(&mut self, message: String) {
        self.loading = false;
        self.last_error = Some(message);
    }

    pub(crate) fn set_search_query(&mut self, query: String) {
        self.search_query = query;
    }

    /// Expanded ids survive filtering; hidden items keep their flag.
    pub(crate) fn toggle_expanded(&mut self, id: SceneId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub(crate) fn reset_transient(&mut self) {
        self.loading = false;
    }
}
