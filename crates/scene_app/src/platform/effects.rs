use std::collections::HashMap;
use std::sync::Arc;

use scene_core::{Effect, LocalImage, Msg, Outcome, Scene};
use scene_engine::{
    ApiError, ApiReply, EngineCommand, EngineEvent, EngineHandle, HeadlessViewer, RequestId,
    SceneApi, ViewerError, ViewerSession,
};
use scene_logging::{scene_debug, scene_error, scene_info, scene_warn};

use super::prompt::UserInteraction;

const CANVAS: &str = "gl1";
pub const SESSION_EXPIRED: &str =
    "Your session has expired. Log in again with `scene-viewer login <username>`.";

/// What an in-flight request settles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Upload,
    Process,
    Scenes,
    ResultScene,
    Download,
    Delete,
    Login,
}

/// Executes effects against the engine, the viewer and the user, and turns
/// engine completions back into messages.
pub struct EffectRunner<U: UserInteraction> {
    api: Arc<dyn SceneApi>,
    engine: EngineHandle,
    viewer: ViewerSession<HeadlessViewer>,
    ui: U,
    pending: HashMap<RequestId, Pending>,
    session_expired: bool,
}

impl<U: UserInteraction> EffectRunner<U> {
    pub fn new(api: Arc<dyn SceneApi>, ui: U) -> Result<Self, ViewerError> {
        Ok(Self {
            engine: EngineHandle::new(api.clone()),
            api,
            viewer: ViewerSession::new(HeadlessViewer::new(), CANVAS)?,
            ui,
            pending: HashMap::new(),
            session_expired: false,
        })
    }

    pub fn viewer(&self) -> &HeadlessViewer {
        self.viewer.viewer()
    }

    #[cfg(test)]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    /// Re-attach images remembered from an earlier run.
    pub fn attach_restored(&mut self, images: &[LocalImage]) {
        if let Err(err) = self.viewer.attach_local(images) {
            scene_warn!("Could not re-attach restored images: {}", err);
        }
    }

    /// Executes `effects` in order. Returns messages that answer an effect
    /// synchronously, such as a confirmation.
    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut immediate = Vec::new();
        for effect in effects {
            match effect {
                Effect::AttachFiles { images } => match self.viewer.attach_local(&images) {
                    Ok(added) => scene_debug!("Attached {} volume(s)", added),
                    Err(err) => scene_error!("Failed to attach files: {}", err),
                },
                Effect::UploadScene { files, title } => {
                    self.submit(EngineCommand::UploadScene { files, title }, Pending::Upload);
                }
                Effect::CreateScene { body } => {
                    self.submit(EngineCommand::CreateScene { body }, Pending::Process);
                }
                Effect::UpdateScene { scene_id, body } => {
                    self.submit(EngineCommand::UpdateScene { scene_id, body }, Pending::Process);
                }
                Effect::FetchScenes => self.submit(EngineCommand::ListScenes, Pending::Scenes),
                Effect::FetchScene { scene_id } => {
                    self.submit(EngineCommand::ReadScene { scene_id }, Pending::ResultScene);
                }
                Effect::DeleteScene { scene_id } => {
                    self.submit(EngineCommand::DeleteScene { scene_id }, Pending::Delete);
                }
                Effect::DeleteAllScenes => {
                    self.submit(EngineCommand::DeleteAllScenes, Pending::Delete);
                }
                Effect::RequestConfirmation { token, prompt } => {
                    let accepted = self.ui.confirm(&prompt);
                    scene_info!("Confirmation {} answered: {}", token, accepted);
                    immediate.push(Msg::ConfirmationAnswered { token, accepted });
                }
                Effect::LoadVolume { url, name } => {
                    if let Err(err) = self.viewer.load_result(&url, &name) {
                        scene_error!("Failed to load volume {}: {}", name, err);
                    }
                }
                Effect::SetSliceType(slice_type) => self.viewer.set_slice_type(slice_type),
                Effect::ShowOnlyImage { visible, hidden } => {
                    if let Err(err) = self.viewer.show_only(visible, &hidden) {
                        scene_error!("Failed to change visibility: {}", err);
                    }
                }
                Effect::Download(plan) => {
                    self.submit(EngineCommand::Download(plan), Pending::Download);
                }
                Effect::Alert(message) => self.ui.alert(&message),
                Effect::Login { username, password } => {
                    self.submit(EngineCommand::Login { username, password }, Pending::Login);
                }
                Effect::Logout => {
                    if let Err(err) = self.api.logout() {
                        scene_error!("Failed to clear access token: {}", err);
                    }
                }
                Effect::RedirectToLogin => {
                    if !self.session_expired {
                        self.session_expired = true;
                        self.ui.alert(SESSION_EXPIRED);
                    }
                }
            }
        }
        immediate
    }

    /// Blocks until the next request settles. `None` when nothing is in
    /// flight or the engine stopped.
    pub fn next_message(&mut self) -> Option<Msg> {
        if self.pending.is_empty() {
            return None;
        }
        let EngineEvent::RequestCompleted { request_id, result } = self.engine.recv()?;
        let Some(pending) = self.pending.remove(&request_id) else {
            scene_warn!("Completion for unknown request {}", request_id);
            return Some(Msg::NoOp);
        };
        Some(settle(pending, result))
    }

    fn submit(&mut self, command: EngineCommand, pending: Pending) {
        let request_id = self.engine.submit(command);
        self.pending.insert(request_id, pending);
    }
}

fn settle(pending: Pending, result: Result<ApiReply, ApiError>) -> Msg {
    if let Err(err) = &result {
        if err.is_unauthorized() {
            return Msg::SessionExpired;
        }
        scene_error!("{:?} request failed: {}", pending, err);
    }
    match pending {
        Pending::Upload => Msg::UploadSettled {
            result: scene_reply(result),
        },
        Pending::Process => Msg::ProcessSettled {
            result: scene_reply(result),
        },
        Pending::ResultScene => Msg::ResultSceneLoaded {
            result: scene_reply(result),
        },
        Pending::Scenes => Msg::ScenesLoaded {
            result: reply(result, |reply| match reply {
                ApiReply::Scenes(scenes) => Some(scenes),
                _ => None,
            }),
        },
        Pending::Download => Msg::DownloadSettled {
            result: reply(result, |reply| match reply {
                ApiReply::Downloaded(path) => Some(path),
                _ => None,
            }),
        },
        Pending::Delete => Msg::DeleteSettled {
            result: reply(result, |reply| match reply {
                ApiReply::Message(_) => Some(()),
                _ => None,
            }),
        },
        Pending::Login => Msg::LoginSettled {
            result: reply(result, |reply| match reply {
                ApiReply::LoggedIn => Some(()),
                _ => None,
            }),
        },
    }
}

fn scene_reply(result: Result<ApiReply, ApiError>) -> Outcome<Scene> {
    reply(result, |reply| match reply {
        ApiReply::Scene(scene) => Some(scene),
        _ => None,
    })
}

fn reply<T>(
    result: Result<ApiReply, ApiError>,
    extract: impl FnOnce(ApiReply) -> Option<T>,
) -> Outcome<T> {
    match result {
        Ok(reply) => extract(reply).ok_or_else(|| "Unexpected response from server".to_string()),
        Err(err) => Err(err.user_message()),
    }
}
