use chrono::{DateTime, Utc};
use scene_logging::short_id;

use crate::accessors::{
    format_date, format_duration, image_array, image_count, image_display_name,
    processing_message, scene_property,
};
use crate::download::{DownloadSelection, FileKind};
use crate::scene::{Scene, SceneId, SceneStatus};
use crate::state::{AppState, LocalImageId, UploadStatus, ViewOutcome};
use crate::viewer::ViewMode;
use crate::ConfirmToken;

pub const EMPTY_HISTORY: &str =
    "Your processing history will appear here after you process images.";
pub const NO_MATCHES: &str =
    "Try searching with different keywords or clear the search to see all items.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub upload: UploadStatus,
    pub scene_id: Option<SceneId>,
    pub images: Vec<ImageRowView>,
    pub view_mode: ViewMode,
    pub selected_tool: Option<String>,
    pub operations: Vec<String>,
    pub can_process: bool,
    pub submitting: bool,
    pub history: HistoryView,
    pub download: Option<DownloadDialogView>,
    pub pending_confirmation: Option<(ConfirmToken, String)>,
    pub last_view: Option<ViewOutcome>,
    pub session_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRowView {
    pub id: LocalImageId,
    pub name: String,
    pub selected: bool,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryView {
    pub loaded: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub total: usize,
    pub search_query: String,
    /// "N of M items match" while a search is active.
    pub match_summary: Option<String>,
    /// Empty-state hint when nothing is shown.
    pub placeholder: Option<&'static str>,
    pub can_clear_all: bool,
    pub cards: Vec<SceneCardView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneActions {
    pub view: bool,
    pub download: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCardView {
    pub id: SceneId,
    pub short_id: String,
    pub tool_name: String,
    pub status: SceneStatus,
    pub status_label: &'static str,
    pub date: String,
    pub duration: String,
    pub image_count: usize,
    pub error: Option<String>,
    pub actions: SceneActions,
    pub expanded: bool,
    pub details: Option<SceneDetailsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDetailsView {
    pub image_names: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDialogView {
    pub scene_id: SceneId,
    pub tool_name: String,
    pub files: Vec<DownloadFileRow>,
    pub selected: usize,
    pub select_all_label: &'static str,
    pub can_confirm: bool,
    pub downloading: bool,
    /// Whether confirming would fetch one archive instead of a single file.
    pub as_archive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFileRow {
    pub id: String,
    pub display_name: String,
    pub filename: String,
    pub format: String,
    pub kind: FileKind,
    pub selected: bool,
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState, now: DateTime<Utc>) -> Self {
        let selected = state.images.iter().any(|image| image.selected);
        Self {
            upload: state.upload.clone(),
            scene_id: state.scene_id.clone(),
            images: state
                .images
                .iter()
                .enumerate()
                .map(|(index, image)| ImageRowView {
                    id: image.id,
                    name: image.name.clone(),
                    selected: image.selected,
                    focused: state.current_image == Some(index),
                })
                .collect(),
            view_mode: state.view_mode,
            selected_tool: state.selected_tool.clone(),
            operations: state
                .niimath_operations
                .iter()
                .map(|operation| operation.command_line())
                .collect(),
            can_process: selected && state.selected_tool.is_some(),
            submitting: state.submitting,
            history: history_view(state, now),
            download: state.download.as_ref().map(download_view),
            pending_confirmation: state
                .confirmations
                .pending()
                .map(|(token, action)| (token, action.prompt().to_string())),
            last_view: state.last_view.clone(),
            session_expired: state.session_expired,
        }
    }
}

fn history_view(state: &AppState, now: DateTime<Utc>) -> HistoryView {
    let history = &state.history;
    let total = history.scenes().len();
    let cards: Vec<SceneCardView> = history
        .filtered()
        .map(|scene| scene_card(scene, history.is_expanded(&scene.id), now))
        .collect();
    let searching = !history.search_query().is_empty();

    let placeholder = if history.is_loaded() && total == 0 {
        Some(EMPTY_HISTORY)
    } else if searching && cards.is_empty() {
        Some(NO_MATCHES)
    } else {
        None
    };

    HistoryView {
        loaded: history.is_loaded(),
        loading: history.is_loading(),
        error: history.last_error().map(ToOwned::to_owned),
        total,
        search_query: history.search_query().to_string(),
        match_summary: searching.then(|| {
            format!(
                "{} of {} items match \"{}\"",
                cards.len(),
                total,
                history.search_query()
            )
        }),
        placeholder,
        can_clear_all: total > 0,
        cards,
    }
}

fn scene_card(scene: &Scene, expanded: bool, now: DateTime<Utc>) -> SceneCardView {
    let timestamp = scene_property(scene, "timestamp", "");
    SceneCardView {
        id: scene.id.clone(),
        short_id: short_id(&scene.id).to_string(),
        tool_name: scene_property(scene, "tool_name", "Unknown Tool").to_string(),
        status: scene.status,
        status_label: scene.status.label(),
        date: format_date(timestamp),
        duration: format_duration(timestamp, now),
        image_count: image_count(scene),
        error: scene.error.clone().filter(|_| scene.status == SceneStatus::Failed),
        actions: SceneActions {
            view: scene.status.allows_view(),
            download: scene.status.allows_download(),
            delete: scene.status.allows_delete(),
        },
        expanded,
        details: expanded.then(|| SceneDetailsView {
            image_names: image_array(scene)
                .iter()
                .enumerate()
                .map(|(index, image)| image_display_name(image, index))
                .collect(),
            message: processing_message(scene, now),
        }),
    }
}

fn download_view(selection: &DownloadSelection) -> DownloadDialogView {
    let scene = selection.scene();
    DownloadDialogView {
        scene_id: scene.id.clone(),
        tool_name: scene_property(scene, "tool_name", "processing").to_string(),
        files: selection
            .files()
            .iter()
            .map(|file| DownloadFileRow {
                id: file.id.clone(),
                display_name: file.display_name.clone(),
                filename: file.filename.clone(),
                format: file.format().to_string(),
                kind: file.kind,
                selected: selection.is_selected(&file.id),
            })
            .collect(),
        selected: selection.selected_count(),
        select_all_label: if selection.all_selected() {
            "Deselect All"
        } else {
            "Select All"
        },
        can_confirm: selection.can_confirm(),
        downloading: selection.is_downloading(),
        as_archive: selection.selected_count() > 1,
    }
}
