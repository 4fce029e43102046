//! Scene core: data model, safe accessors and the pure client state machine.
pub mod accessors;
mod confirm;
mod download;
mod effect;
mod history;
mod msg;
mod scene;
mod state;
mod status;
mod update;
mod view_model;
mod viewer;

pub use confirm::{ConfirmToken, ConfirmationGate, DestructiveAction};
pub use download::{
    batch_archive_name, batch_archive_url, downloadable_files, file_format,
    scene_downloadable_files, DownloadPlan, DownloadSelection, DownloadableFile, FileKind,
};
pub use effect::Effect;
pub use history::HistoryState;
pub use msg::{Msg, Outcome};
pub use scene::{
    find_tool, image_option, nv_document, tool_parameters, NiimathOperation, ProcessingTool,
    Scene, SceneCreate, SceneId, SceneStatus, SceneUpdate, ScenesPage, ToolParameters,
    PROCESSING_TOOLS,
};
pub use state::{
    local_volume_id, AppState, LocalFile, LocalImage, LocalImageId, SessionSnapshot,
    UploadStatus, ViewOutcome,
};
pub use status::StatusLedger;
pub use update::{update, DOWNLOAD_FAILED, NO_IMAGE_OPTIONS, SELECTION_REQUIRED};
pub use view_model::{
    AppViewModel, DownloadDialogView, DownloadFileRow, HistoryView, ImageRowView, SceneActions,
    SceneCardView, SceneDetailsView, EMPTY_HISTORY, NO_MATCHES,
};
pub use viewer::{SliceType, ViewMode};
