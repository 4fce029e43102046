use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use scene_core::{DownloadPlan, LocalFile, SceneCreate, SceneId, SceneUpdate};
use scene_logging::{scene_debug, scene_error};

use crate::client::SceneApi;
use crate::types::{ApiError, ApiReply, EngineEvent, RequestId};

#[derive(Debug, Clone)]
pub enum EngineCommand {
    ListScenes,
    ReadScene { scene_id: SceneId },
    CreateScene { body: SceneCreate },
    UpdateScene { scene_id: SceneId, body: SceneUpdate },
    DeleteScene { scene_id: SceneId },
    DeleteAllScenes,
    UploadScene { files: Vec<LocalFile>, title: String },
    Download(DownloadPlan),
    Login { username: String, password: String },
}

/// Runs API calls on a background tokio runtime; results come back as events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<(RequestId, EngineCommand)>,
    event_rx: mpsc::Receiver<EngineEvent>,
    next_id: AtomicU64,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn SceneApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<(RequestId, EngineCommand)>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    scene_error!("Cannot start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok((request_id, command)) = cmd_rx.recv() {
                let api = api.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let result = execute(api.as_ref(), command).await;
                    let _ = event_tx.send(EngineEvent::RequestCompleted { request_id, result });
                });
            }
        });

        Self {
            cmd_tx,
            event_rx,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn submit(&self, command: EngineCommand) -> RequestId {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        scene_debug!("Request {} submitted: {}", request_id, command_name(&command));
        let _ = self.cmd_tx.send((request_id, command));
        request_id
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

fn command_name(command: &EngineCommand) -> &'static str {
    match command {
        EngineCommand::ListScenes => "list scenes",
        EngineCommand::ReadScene { .. } => "read scene",
        EngineCommand::CreateScene { .. } => "create scene",
        EngineCommand::UpdateScene { .. } => "update scene",
        EngineCommand::DeleteScene { .. } => "delete scene",
        EngineCommand::DeleteAllScenes => "delete all scenes",
        EngineCommand::UploadScene { .. } => "upload scene",
        EngineCommand::Download(_) => "download",
        EngineCommand::Login { .. } => "login",
    }
}

async fn execute(api: &dyn SceneApi, command: EngineCommand) -> Result<ApiReply, ApiError> {
    match command {
        EngineCommand::ListScenes => api.list_scenes().await.map(ApiReply::Scenes),
        EngineCommand::ReadScene { scene_id } => api.read_scene(&scene_id).await.map(ApiReply::Scene),
        EngineCommand::CreateScene { body } => api.create_scene(&body).await.map(ApiReply::Scene),
        EngineCommand::UpdateScene { scene_id, body } => {
            api.update_scene(&scene_id, &body).await.map(ApiReply::Scene)
        }
        EngineCommand::DeleteScene { scene_id } => {
            api.delete_scene(&scene_id).await.map(ApiReply::Message)
        }
        EngineCommand::DeleteAllScenes => api.delete_all_scenes().await.map(ApiReply::Message),
        EngineCommand::UploadScene { files, title } => {
            api.upload_scene(&files, &title).await.map(ApiReply::Scene)
        }
        EngineCommand::Download(plan) => api.download(&plan).await.map(ApiReply::Downloaded),
        EngineCommand::Login { username, password } => api
            .login(&username, &password)
            .await
            .map(|()| ApiReply::LoggedIn),
    }
}
