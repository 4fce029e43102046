use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::confirm::ConfirmationGate;
use crate::download::DownloadSelection;
use crate::history::HistoryState;
use crate::scene::{NiimathOperation, Scene, SceneId};
use crate::view_model::AppViewModel;
use crate::viewer::ViewMode;

pub type LocalImageId = u64;

/// Identifier the viewer uses for the volume of local image `id`.
pub fn local_volume_id(id: LocalImageId) -> String {
    format!("local-{id}")
}

/// Upload workflow: `Idle -> Uploading -> Processing | Error`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Error(String),
}

/// A file picked by the user, before it is attached anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub path: PathBuf,
}

impl LocalFile {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// A file attached to the live viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub id: LocalImageId,
    pub name: String,
    pub path: PathBuf,
    pub selected: bool,
}

impl LocalImage {
    pub fn volume_id(&self) -> String {
        local_volume_id(self.id)
    }
}

/// Local session that outlives a single run of the front end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub scene_id: Option<SceneId>,
    pub images: Vec<LocalImage>,
    pub selected_tool: Option<String>,
    pub niimath_operations: Vec<NiimathOperation>,
    pub view_mode: ViewMode,
    /// `nv_document` of the scene the upload created, used to narrow later submissions.
    pub uploaded_document: Option<Value>,
}

/// Outcome of the most recent "view result" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutcome {
    pub scene_id: SceneId,
    pub loaded: Vec<String>,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) upload: UploadStatus,
    pub(crate) scene_id: Option<SceneId>,
    pub(crate) uploaded_scene: Option<Scene>,
    pub(crate) images: Vec<LocalImage>,
    pub(crate) next_image_id: LocalImageId,
    pub(crate) current_image: Option<usize>,
    pub(crate) view_mode: ViewMode,
    pub(crate) selected_tool: Option<String>,
    pub(crate) niimath_operations: Vec<NiimathOperation>,
    pub(crate) submitting: bool,
    pub(crate) history: HistoryState,
    pub(crate) confirmations: ConfirmationGate,
    pub(crate) download: Option<DownloadSelection>,
    pub(crate) viewing: Option<SceneId>,
    pub(crate) last_view: Option<ViewOutcome>,
    pub(crate) session_expired: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, now: DateTime<Utc>) -> AppViewModel {
        AppViewModel::build(self, now)
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    pub fn download(&self) -> Option<&DownloadSelection> {
        self.download.as_ref()
    }

    pub fn scene_id(&self) -> Option<&str> {
        self.scene_id.as_deref()
    }

    pub fn images(&self) -> &[LocalImage] {
        &self.images
    }

    pub fn is_busy(&self) -> bool {
        self.upload == UploadStatus::Uploading
            || self.submitting
            || self.history.is_loading()
            || self.viewing.is_some()
            || self
                .download
                .as_ref()
                .is_some_and(DownloadSelection::is_downloading)
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            scene_id: self.scene_id.clone(),
            images: self.images.clone(),
            selected_tool: self.selected_tool.clone(),
            niimath_operations: self.niimath_operations.clone(),
            view_mode: self.view_mode,
            uploaded_document: self
                .uploaded_scene
                .as_ref()
                .map(|scene| scene.nv_document.clone()),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: SessionSnapshot) {
        self.next_image_id = snapshot
            .images
            .iter()
            .map(|image| image.id)
            .max()
            .unwrap_or(0);
        self.current_image = (!snapshot.images.is_empty()).then_some(0);
        self.uploaded_scene = snapshot
            .scene_id
            .as_ref()
            .zip(snapshot.uploaded_document)
            .map(|(scene_id, document)| Scene {
                nv_document: document,
                ..Scene::new(scene_id.clone())
            });
        self.scene_id = snapshot.scene_id;
        self.images = snapshot.images;
        self.selected_tool = snapshot.selected_tool;
        self.niimath_operations = snapshot.niimath_operations;
        self.view_mode = snapshot.view_mode;
    }

    pub(crate) fn attach_files(&mut self, files: &[LocalFile]) -> Vec<LocalImage> {
        let first_new = self.images.len();
        let attached: Vec<LocalImage> = files
            .iter()
            .map(|file| {
                self.next_image_id += 1;
                LocalImage {
                    id: self.next_image_id,
                    name: file.name.clone(),
                    path: file.path.clone(),
                    selected: false,
                }
            })
            .collect();
        self.images.extend(attached.iter().cloned());
        if self.current_image.is_none() && !attached.is_empty() {
            self.current_image = Some(first_new);
        }
        attached
    }

    pub(crate) fn selected_images(&self) -> Vec<&LocalImage> {
        self.images.iter().filter(|image| image.selected).collect()
    }

    /// Drops in-flight markers after the session was invalidated.
    pub(crate) fn reset_transient(&mut self) {
        if self.upload == UploadStatus::Uploading {
            self.upload = UploadStatus::Idle;
        }
        self.submitting = false;
        self.viewing = None;
        self.history.reset_transient();
        self.confirmations.clear();
        if let Some(download) = self.download.as_mut() {
            download.set_downloading(false);
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
