use std::fs;
use std::path::{Path, PathBuf};

use scene_core::{LocalImage, NiimathOperation, SessionSnapshot};
use scene_engine::AtomicFileWriter;
use scene_logging::{scene_debug, scene_error, scene_info, scene_warn};
use serde::{Deserialize, Serialize};

pub const SESSION_FILENAME: &str = "session.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedImage {
    id: u64,
    name: String,
    path: PathBuf,
    #[serde(default)]
    selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedOperation {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    #[serde(default)]
    scene_id: Option<String>,
    #[serde(default)]
    images: Vec<PersistedImage>,
    #[serde(default)]
    selected_tool: Option<String>,
    #[serde(default)]
    operations: Vec<PersistedOperation>,
    #[serde(default)]
    view_mode: String,
    /// JSON text of the uploaded scene's `nv_document`.
    #[serde(default)]
    uploaded_document: Option<String>,
}

/// Session saved by the previous run, or `None` when there is none or it is unreadable.
pub(crate) fn load_session(state_dir: &Path) -> Option<SessionSnapshot> {
    let path = state_dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            scene_warn!("Failed to read session from {:?}: {}", path, err);
            return None;
        }
    };

    let session: PersistedSession = match ron::from_str(&content) {
        Ok(session) => session,
        Err(err) => {
            scene_warn!("Failed to parse session from {:?}: {}", path, err);
            return None;
        }
    };

    scene_debug!("Loaded session from {:?}", path);
    Some(SessionSnapshot {
        scene_id: session.scene_id,
        images: session
            .images
            .into_iter()
            .map(|image| LocalImage {
                id: image.id,
                name: image.name,
                path: image.path,
                selected: image.selected,
            })
            .collect(),
        selected_tool: session.selected_tool,
        niimath_operations: session
            .operations
            .into_iter()
            .map(|op| NiimathOperation::new(op.name, op.args))
            .collect(),
        view_mode: session.view_mode.parse().unwrap_or_default(),
        uploaded_document: session.uploaded_document.and_then(|text| {
            match serde_json::from_str(&text) {
                Ok(document) => Some(document),
                Err(err) => {
                    scene_warn!("Dropping unreadable uploaded document: {}", err);
                    None
                }
            }
        }),
    })
}

pub(crate) fn save_session(state_dir: &Path, snapshot: &SessionSnapshot) {
    let session = PersistedSession {
        scene_id: snapshot.scene_id.clone(),
        images: snapshot
            .images
            .iter()
            .map(|image| PersistedImage {
                id: image.id,
                name: image.name.clone(),
                path: image.path.clone(),
                selected: image.selected,
            })
            .collect(),
        selected_tool: snapshot.selected_tool.clone(),
        operations: snapshot
            .niimath_operations
            .iter()
            .map(|op| PersistedOperation {
                name: op.name.clone(),
                args: op.args.clone(),
            })
            .collect(),
        view_mode: snapshot.view_mode.as_str().to_string(),
        uploaded_document: snapshot
            .uploaded_document
            .as_ref()
            .map(|document| document.to_string()),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&session, pretty) {
        Ok(text) => text,
        Err(err) => {
            scene_error!("Failed to serialize session: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    match writer.write(SESSION_FILENAME, content.as_bytes()) {
        Ok(path) => scene_info!("Saved session to {:?}", path),
        Err(err) => scene_error!("Failed to write session to {:?}: {}", state_dir, err),
    }
}
