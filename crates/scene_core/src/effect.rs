use crate::confirm::ConfirmToken;
use crate::download::DownloadPlan;
use crate::scene::{SceneCreate, SceneId, SceneUpdate};
use crate::state::{LocalFile, LocalImage, LocalImageId};
use crate::viewer::SliceType;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Add freshly picked files to the live viewer.
    AttachFiles { images: Vec<LocalImage> },
    UploadScene { files: Vec<LocalFile>, title: String },
    CreateScene { body: SceneCreate },
    UpdateScene { scene_id: SceneId, body: SceneUpdate },
    /// Invalidate and refetch the scene collection.
    FetchScenes,
    FetchScene { scene_id: SceneId },
    DeleteScene { scene_id: SceneId },
    DeleteAllScenes,
    RequestConfirmation { token: ConfirmToken, prompt: String },
    LoadVolume { url: String, name: String },
    SetSliceType(SliceType),
    ShowOnlyImage {
        visible: LocalImageId,
        hidden: Vec<LocalImageId>,
    },
    Download(DownloadPlan),
    /// Blocking, user-visible message.
    Alert(String),
    Login { username: String, password: String },
    Logout,
    RedirectToLogin,
}
