use crate::scene::SceneId;

pub type ConfirmToken = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestructiveAction {
    DeleteScene { scene_id: SceneId },
    DeleteAllScenes,
}

impl DestructiveAction {
    pub fn prompt(&self) -> &'static str {
        match self {
            DestructiveAction::DeleteScene { .. } => "Are you sure you want to delete this scene?",
            DestructiveAction::DeleteAllScenes => {
                "Are you sure you want to clear all processing history?"
            }
        }
    }
}

/// Two-step gate in front of destructive actions: `request` hands out a
/// token, and only an accepted answer carrying the latest token releases the
/// action. A newer request supersedes an unanswered one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfirmationGate {
    last_token: ConfirmToken,
    pending: Option<(ConfirmToken, DestructiveAction)>,
}

impl ConfirmationGate {
    pub fn request(&mut self, action: DestructiveAction) -> ConfirmToken {
        self.last_token += 1;
        self.pending = Some((self.last_token, action));
        self.last_token
    }

    pub fn pending(&self) -> Option<(ConfirmToken, &DestructiveAction)> {
        self.pending.as_ref().map(|(token, action)| (*token, action))
    }

    /// Stale tokens leave the pending request untouched.
    pub fn resolve(&mut self, token: ConfirmToken, accepted: bool) -> Option<DestructiveAction> {
        match &self.pending {
            Some((pending, _)) if *pending == token => {}
            _ => return None,
        }
        let (_, action) = self.pending.take()?;
        accepted.then_some(action)
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
    }
}
