use chrono::NaiveDateTime;
use scene_logging::{scene_debug, scene_error, scene_info, scene_warn};
use serde_json::Value;

use crate::accessors::{final_path_segment, image_array, image_display_name, result_url};
use crate::confirm::DestructiveAction;
use crate::download::DownloadSelection;
use crate::scene::{
    find_tool, image_option, nv_document, tool_parameters, Scene, SceneCreate, SceneStatus,
    SceneUpdate,
};
use crate::state::{LocalImage, UploadStatus, ViewOutcome};
use crate::{AppState, Effect, Msg};

pub const SELECTION_REQUIRED: &str = "Please select at least one image and a processing tool";
pub const DOWNLOAD_FAILED: &str = "Download failed. Please try again.";
pub const NO_IMAGE_OPTIONS: &str = "No image options available in the result";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreSession(snapshot) => {
            state.restore(snapshot);
            state.mark_dirty();
            vec![Effect::SetSliceType(state.view_mode.slice_type())]
        }
        Msg::FilesSelected { files, at } => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            let images = state.attach_files(&files);
            state.upload = UploadStatus::Uploading;
            state.mark_dirty();
            scene_info!("Uploading {} file(s)", files.len());
            vec![
                Effect::AttachFiles { images },
                Effect::UploadScene {
                    files,
                    title: upload_title(at),
                },
            ]
        }
        Msg::UploadSettled { result } => {
            match result {
                Ok(scene) => {
                    scene_info!("Upload created scene {}", scene.id);
                    state.scene_id = Some(scene.id.clone());
                    state.uploaded_scene = Some(scene);
                    state.upload = UploadStatus::Processing;
                }
                Err(message) => {
                    scene_error!("Combined upload failed: {}", message);
                    state.upload =
                        UploadStatus::Error(format!("Upload and scene creation failed: {message}"));
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::ImageSelectionToggled { image_id } => {
            if let Some(image) = state.images.iter_mut().find(|image| image.id == image_id) {
                image.selected = !image.selected;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ImageFocused { index } => {
            let Some(focused) = state.images.get(index) else {
                return (state, Vec::new());
            };
            let visible = focused.id;
            let hidden = state
                .images
                .iter()
                .filter(|image| image.id != visible)
                .map(|image| image.id)
                .collect();
            state.current_image = Some(index);
            state.mark_dirty();
            vec![Effect::ShowOnlyImage { visible, hidden }]
        }
        Msg::ViewModeChanged(mode) => {
            state.view_mode = mode;
            state.mark_dirty();
            vec![Effect::SetSliceType(mode.slice_type())]
        }
        Msg::ToolSelected(tool) => match tool {
            Some(id) if find_tool(&id).is_none() => {
                scene_warn!("Rejected unknown processing tool {}", id);
                vec![Effect::Alert(format!("Unknown processing tool: {id}"))]
            }
            tool => {
                state.selected_tool = tool;
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::NiimathOperationAdded(operation) => {
            state.niimath_operations.push(operation);
            state.mark_dirty();
            Vec::new()
        }
        Msg::NiimathOperationsCleared => {
            if !state.niimath_operations.is_empty() {
                state.niimath_operations.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ProcessClicked => submit_processing(&mut state),
        Msg::ProcessSettled { result } => {
            state.submitting = false;
            state.mark_dirty();
            let mut effects = Vec::with_capacity(2);
            match result {
                Ok(scene) => {
                    scene_info!("Scene {} submitted ({})", scene.id, scene.status.as_str());
                    if state.scene_id.is_none() {
                        state.scene_id = Some(scene.id);
                    }
                }
                Err(message) => {
                    scene_error!("Processing submission failed: {}", message);
                    effects.push(Effect::Alert(message));
                }
            }
            // Settled: always invalidate, after the success/error handling.
            effects.push(Effect::FetchScenes);
            effects
        }
        Msg::HistoryRequested => {
            state.history.mark_loading();
            state.mark_dirty();
            vec![Effect::FetchScenes]
        }
        Msg::ScenesLoaded { result } => {
            match result {
                Ok(scenes) => {
                    scene_debug!("Fetched {} scene(s)", scenes.len());
                    state.history.apply_fetch(scenes);
                }
                Err(message) => {
                    scene_error!("Failed to fetch scenes: {}", message);
                    state.history.apply_fetch_error(message);
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::SearchChanged(query) => {
            state.history.set_search_query(query);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ExpandToggled { scene_id } => {
            state.history.toggle_expanded(scene_id);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ViewResultClicked { scene_id } => {
            state.viewing = Some(scene_id.clone());
            state.mark_dirty();
            vec![Effect::FetchScene { scene_id }]
        }
        Msg::ResultSceneLoaded { result } => {
            state.viewing = None;
            state.mark_dirty();
            match result {
                Ok(scene) => view_result(&mut state, &scene),
                Err(message) => {
                    scene_error!("Failed to read scene for viewing: {}", message);
                    vec![Effect::Alert(message)]
                }
            }
        }
        Msg::DownloadClicked { scene_id } => match state.history.find(&scene_id) {
            None => vec![Effect::Alert(format!("Scene {scene_id} not found"))],
            Some(scene) if !scene.status.allows_download() => vec![Effect::Alert(format!(
                "Scene {scene_id} is {}; only completed scenes can be downloaded",
                scene.status.as_str()
            ))],
            Some(scene) => {
                state.download = Some(DownloadSelection::new(scene.clone()));
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::DownloadFileToggled { file_id } => {
            if let Some(download) = state.download.as_mut() {
                if download.toggle(&file_id) {
                    state.mark_dirty();
                } else {
                    scene_warn!("Ignoring toggle for unknown file {}", file_id);
                }
            }
            Vec::new()
        }
        Msg::DownloadSelectAllToggled => {
            if let Some(download) = state.download.as_mut() {
                download.toggle_all();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DownloadConfirmed { today } => {
            let Some(download) = state.download.as_mut() else {
                return (state, Vec::new());
            };
            if !download.can_confirm() {
                return (state, Vec::new());
            }
            match download.plan(today) {
                Some(plan) => {
                    download.set_downloading(true);
                    state.mark_dirty();
                    vec![Effect::Download(plan)]
                }
                None => Vec::new(),
            }
        }
        Msg::DownloadCancelled => {
            if state
                .download
                .as_ref()
                .is_some_and(|download| !download.is_downloading())
            {
                state.download = None;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DownloadSettled { result } => {
            state.mark_dirty();
            match result {
                Ok(path) => {
                    scene_info!("Download saved to {}", path.display());
                    state.download = None;
                    Vec::new()
                }
                Err(message) => {
                    scene_error!("Download failed: {}", message);
                    if let Some(download) = state.download.as_mut() {
                        download.set_downloading(false);
                    }
                    vec![Effect::Alert(DOWNLOAD_FAILED.to_string())]
                }
            }
        }
        Msg::DeleteClicked { scene_id } => match state.history.find(&scene_id) {
            None => vec![Effect::Alert(format!("Scene {scene_id} not found"))],
            Some(scene) if !scene.status.allows_delete() => vec![Effect::Alert(format!(
                "Scene {scene_id} is {}; only failed scenes can be removed",
                scene.status.as_str()
            ))],
            Some(_) => request_confirmation(&mut state, DestructiveAction::DeleteScene { scene_id }),
        },
        Msg::DeleteAllClicked => {
            if state.history.scenes().is_empty() {
                return (state, Vec::new());
            }
            request_confirmation(&mut state, DestructiveAction::DeleteAllScenes)
        }
        Msg::ConfirmationAnswered { token, accepted } => {
            state.mark_dirty();
            match state.confirmations.resolve(token, accepted) {
                Some(DestructiveAction::DeleteScene { scene_id }) => {
                    vec![Effect::DeleteScene { scene_id }]
                }
                Some(DestructiveAction::DeleteAllScenes) => vec![Effect::DeleteAllScenes],
                None => Vec::new(),
            }
        }
        Msg::DeleteSettled { result } => {
            let mut effects = Vec::with_capacity(2);
            if let Err(message) = result {
                scene_error!("Delete failed: {}", message);
                effects.push(Effect::Alert(message));
            }
            effects.push(Effect::FetchScenes);
            effects
        }
        Msg::LoginSubmitted { username, password } => vec![Effect::Login { username, password }],
        Msg::LoginSettled { result } => match result {
            Ok(()) => {
                state.session_expired = false;
                state.mark_dirty();
                Vec::new()
            }
            Err(message) => vec![Effect::Alert(message)],
        },
        Msg::LogoutClicked => {
            state.mark_dirty();
            vec![Effect::Logout]
        }
        Msg::SessionExpired => {
            scene_warn!("Session expired; redirecting to login");
            state.session_expired = true;
            state.reset_transient();
            state.mark_dirty();
            vec![Effect::RedirectToLogin]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn upload_title(at: NaiveDateTime) -> String {
    format!("Upload Scene - {}", at.format("%-m/%-d/%Y, %-I:%M:%S %p"))
}

fn request_confirmation(state: &mut AppState, action: DestructiveAction) -> Vec<Effect> {
    let prompt = action.prompt().to_string();
    let token = state.confirmations.request(action);
    state.mark_dirty();
    vec![Effect::RequestConfirmation { token, prompt }]
}

fn submit_processing(state: &mut AppState) -> Vec<Effect> {
    let selected = state.selected_images();
    let tool = match (&state.selected_tool, selected.is_empty()) {
        (Some(tool), false) => tool.clone(),
        _ => return vec![Effect::Alert(SELECTION_REQUIRED.to_string())],
    };
    let parameters = tool_parameters(&tool, &state.niimath_operations);
    scene_info!(
        "Processing {} image(s) with {} ({} operation(s))",
        selected.len(),
        tool,
        state.niimath_operations.len()
    );

    let effect = match &state.scene_id {
        Some(scene_id) => Effect::UpdateScene {
            scene_id: scene_id.clone(),
            body: SceneUpdate {
                nv_document: state
                    .uploaded_scene
                    .as_ref()
                    .and_then(|scene| uploaded_subset(scene, &selected)),
                tool_name: Some(tool.clone()),
                status: Some(SceneStatus::Processing),
                parameters,
            },
        },
        None => Effect::CreateScene {
            body: SceneCreate {
                nv_document: local_document(&tool, &selected),
                tool_name: Some(tool.clone()),
                status: SceneStatus::Processing,
                parameters,
            },
        },
    };

    state.submitting = true;
    state.mark_dirty();
    vec![effect]
}

/// The uploaded scene's document narrowed to the selected images, or `None`
/// when the names cannot be matched up.
fn uploaded_subset(scene: &Scene, selected: &[&LocalImage]) -> Option<Value> {
    let images: Vec<Value> = image_array(scene)
        .iter()
        .enumerate()
        .filter(|(index, image)| {
            let name = image_display_name(image, *index);
            selected.iter().any(|local| local.name == name)
        })
        .map(|(_, image)| image.clone())
        .collect();
    if images.is_empty() {
        return None;
    }
    let mut document = scene.nv_document.clone();
    if let Some(fields) = document.as_object_mut() {
        fields.insert("imageOptionsArray".to_string(), Value::Array(images));
    }
    Some(document)
}

fn local_document(tool: &str, selected: &[&LocalImage]) -> Value {
    let images = selected
        .iter()
        .map(|image| image_option(&image.volume_id(), &image.name, ""))
        .collect();
    nv_document(&format!("{tool} - {} image(s)", selected.len()), images)
}

fn view_result(state: &mut AppState, scene: &Scene) -> Vec<Effect> {
    if !scene.status.allows_view() {
        return vec![Effect::Alert(format!(
            "Scene {} is {}; results are only available once completed",
            scene.id,
            scene.status.as_str()
        ))];
    }

    let mut effects = Vec::new();
    if let Some(error) = scene.error.as_deref().filter(|e| !e.trim().is_empty()) {
        effects.push(Effect::Alert(format!("Process returned error message {error}")));
    }

    let Some(images) = scene
        .nv_document
        .get("imageOptionsArray")
        .and_then(Value::as_array)
    else {
        effects.push(Effect::Alert(NO_IMAGE_OPTIONS.to_string()));
        return effects;
    };

    let mut outcome = ViewOutcome {
        scene_id: scene.id.clone(),
        loaded: Vec::new(),
        skipped: 0,
    };
    for image in images {
        match result_url(image) {
            Some(url) => {
                let name = final_path_segment(url);
                scene_info!("Loading volume {} from {}", name, url);
                outcome.loaded.push(name.clone());
                effects.push(Effect::LoadVolume {
                    url: url.to_string(),
                    name,
                });
            }
            None => {
                scene_warn!("Image option of scene {} has no resultUrl: {}", scene.id, image);
                outcome.skipped += 1;
            }
        }
    }
    state.last_view = Some(outcome);
    effects
}
