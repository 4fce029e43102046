use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::confirm::ConfirmToken;
use crate::scene::{NiimathOperation, Scene, SceneId};
use crate::state::{LocalFile, LocalImageId, SessionSnapshot};
use crate::viewer::ViewMode;

/// Failures arrive already rendered as user-facing text.
pub type Outcome<T> = Result<T, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Restore the local session saved by a previous run.
    RestoreSession(SessionSnapshot),
    /// User dropped or picked files; `at` is the local wall-clock time.
    FilesSelected {
        files: Vec<LocalFile>,
        at: NaiveDateTime,
    },
    /// Combined upload + create finished.
    UploadSettled { result: Outcome<Scene> },
    ImageSelectionToggled { image_id: LocalImageId },
    /// User focused one attached image in the viewer.
    ImageFocused { index: usize },
    ViewModeChanged(ViewMode),
    ToolSelected(Option<String>),
    NiimathOperationAdded(NiimathOperation),
    NiimathOperationsCleared,
    ProcessClicked,
    ProcessSettled { result: Outcome<Scene> },
    /// Ask for a fresh copy of the scene collection.
    HistoryRequested,
    ScenesLoaded { result: Outcome<Vec<Scene>> },
    SearchChanged(String),
    ExpandToggled { scene_id: SceneId },
    ViewResultClicked { scene_id: SceneId },
    ResultSceneLoaded { result: Outcome<Scene> },
    DownloadClicked { scene_id: SceneId },
    DownloadFileToggled { file_id: String },
    DownloadSelectAllToggled,
    DownloadConfirmed { today: NaiveDate },
    DownloadCancelled,
    DownloadSettled { result: Outcome<PathBuf> },
    DeleteClicked { scene_id: SceneId },
    DeleteAllClicked,
    ConfirmationAnswered { token: ConfirmToken, accepted: bool },
    DeleteSettled { result: Outcome<()> },
    LoginSubmitted { username: String, password: String },
    LoginSettled { result: Outcome<()> },
    LogoutClicked,
    /// The backend rejected our credentials (401/403).
    SessionExpired,
    Tick,
    NoOp,
}
