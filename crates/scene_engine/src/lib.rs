//! Scene engine: REST client, downloads, token storage and the viewer session.
mod client;
mod download;
mod engine;
mod filename;
mod persist;
mod settings;
mod token;
mod types;
mod viewer;

pub use client::{ReqwestSceneClient, SceneApi};
pub use download::download_target;
pub use engine::{EngineCommand, EngineHandle};
pub use filename::download_filename;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError, StagedFile};
pub use settings::{ClientSettings, DEFAULT_API_URL};
pub use token::{FileTokenStore, MemoryTokenStore, TokenError, TokenStore};
pub use types::{error_detail, ApiError, ApiReply, EngineEvent, RequestId, GENERIC_FAILURE};
pub use viewer::{HeadlessViewer, ViewerError, ViewerSession, Volume, VolumeSource, VolumeViewer};
