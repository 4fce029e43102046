use std::io;
use std::path::PathBuf;

use scene_core::Scene;
use serde_json::Value;
use thiserror::Error;

use crate::persist::PersistError;
use crate::token::TokenError;

pub type RequestId = u64;

/// Shown when the server gives no usable `detail`.
pub const GENERIC_FAILURE: &str = "Something went wrong.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("http status {status}: {detail}")]
    HttpStatus { status: u16, detail: String },
    #[error("not authorized (http status {status})")]
    Unauthorized { status: u16 },
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ApiError {
    /// Message suitable for a user-facing alert.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::HttpStatus { detail, .. } => detail.clone(),
            ApiError::ReadFile { path, .. } => format!("Cannot read {}", path.display()),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        if matches!(status, 401 | 403) {
            return ApiError::Unauthorized { status };
        }
        ApiError::HttpStatus {
            status,
            detail: error_detail(body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout;
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Network(err.to_string())
    }
}

/// Pulls `detail` out of an error body: either a plain string, or the `msg`
/// of the first validation entry.
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(entries) => entries
            .first()?
            .get("msg")?
            .as_str()
            .map(ToOwned::to_owned),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ApiReply {
    Scenes(Vec<Scene>),
    Scene(Scene),
    /// Server acknowledgement text of a delete.
    Message(String),
    Downloaded(PathBuf),
    LoggedIn,
}

#[derive(Debug)]
pub enum EngineEvent {
    RequestCompleted {
        request_id: RequestId,
        result: Result<ApiReply, ApiError>,
    },
}
