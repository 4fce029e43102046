use std::collections::HashMap;

use scene_logging::scene_warn;

use crate::scene::{Scene, SceneId, SceneStatus};

/// Remembers the last rendered version of every scene so that refetches can
/// only move a scene forward along `pending -> processing -> {completed, failed}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusLedger {
    rendered: HashMap<SceneId, Scene>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered_status(&self, id: &str) -> Option<SceneStatus> {
        self.rendered.get(id).map(|scene| scene.status)
    }

    /// Applies a freshly fetched collection and returns what should be
    /// rendered. Ids missing from `incoming` are forgotten.
    pub fn reconcile(&mut self, incoming: Vec<Scene>) -> Vec<Scene> {
        let mut next = HashMap::with_capacity(incoming.len());
        let mut rendered = Vec::with_capacity(incoming.len());

        for scene in incoming {
            let scene = match self.rendered.remove(&scene.id) {
                Some(previous) => advance(previous, scene),
                None => scene,
            };
            next.insert(scene.id.clone(), scene.clone());
            rendered.push(scene);
        }

        self.rendered = next;
        rendered
    }
}

fn advance(previous: Scene, incoming: Scene) -> Scene {
    if previous.status == incoming.status {
        return incoming;
    }
    if previous.status.is_terminal() {
        scene_warn!(
            "Ignoring status change {} -> {} for finished scene {}",
            previous.status.as_str(),
            incoming.status.as_str(),
            previous.id
        );
        return previous;
    }
    match (previous.status.rank(), incoming.status.rank()) {
        (Some(before), Some(after)) if after < before => {
            scene_warn!(
                "Ignoring status regression {} -> {} for scene {}",
                previous.status.as_str(),
                incoming.status.as_str(),
                incoming.id
            );
            Scene {
                status: previous.status,
                ..incoming
            }
        }
        (Some(_), None) => Scene {
            status: previous.status,
            ..incoming
        },
        _ => incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, status: SceneStatus) -> Scene {
        Scene {
            status,
            ..Scene::new(id)
        }
    }

    #[test]
    fn forward_transitions_are_rendered() {
        let mut ledger = StatusLedger::new();
        for status in [
            SceneStatus::Pending,
            SceneStatus::Processing,
            SceneStatus::Completed,
        ] {
            let rendered = ledger.reconcile(vec![scene("s1", status)]);
            assert_eq!(rendered[0].status, status);
        }
    }

    #[test]
    fn regressions_and_post_terminal_changes_are_ignored() {
        let mut ledger = StatusLedger::new();
        ledger.reconcile(vec![scene("s1", SceneStatus::Processing)]);
        let rendered = ledger.reconcile(vec![scene("s1", SceneStatus::Pending)]);
        assert_eq!(rendered[0].status, SceneStatus::Processing);

        let mut failed = scene("s1", SceneStatus::Failed);
        failed.error = Some("boom".into());
        ledger.reconcile(vec![failed]);
        let rendered = ledger.reconcile(vec![scene("s1", SceneStatus::Completed)]);
        assert_eq!(rendered[0].status, SceneStatus::Failed);
        assert_eq!(rendered[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn unknown_status_keeps_the_last_known_one() {
        let mut ledger = StatusLedger::new();
        ledger.reconcile(vec![scene("s1", SceneStatus::Processing)]);
        let rendered = ledger.reconcile(vec![scene("s1", SceneStatus::Unknown)]);
        assert_eq!(rendered[0].status, SceneStatus::Processing);
    }

    #[test]
    fn deleted_scenes_are_forgotten() {
        let mut ledger = StatusLedger::new();
        ledger.reconcile(vec![scene("s1", SceneStatus::Completed)]);
        ledger.reconcile(Vec::new());
        assert_eq!(ledger.rendered_status("s1"), None);
        let rendered = ledger.reconcile(vec![scene("s1", SceneStatus::Pending)]);
        assert_eq!(rendered[0].status, SceneStatus::Pending);
    }
}
