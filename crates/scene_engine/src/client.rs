use std::path::PathBuf;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use scene_core::{DownloadPlan, LocalFile, Scene, SceneCreate, SceneUpdate, ScenesPage};
use scene_logging::{scene_debug, scene_info, scene_warn};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::download::{download_target, save_response};
use crate::filename::download_filename;
use crate::persist::AtomicFileWriter;
use crate::settings::ClientSettings;
use crate::token::TokenStore;
use crate::types::ApiError;

/// The scene REST API as the client uses it.
#[async_trait::async_trait]
pub trait SceneApi: Send + Sync {
    async fn list_scenes(&self) -> Result<Vec<Scene>, ApiError>;
    async fn read_scene(&self, scene_id: &str) -> Result<Scene, ApiError>;
    async fn create_scene(&self, body: &SceneCreate) -> Result<Scene, ApiError>;
    async fn update_scene(&self, scene_id: &str, body: &SceneUpdate) -> Result<Scene, ApiError>;
    async fn delete_scene(&self, scene_id: &str) -> Result<String, ApiError>;
    async fn delete_all_scenes(&self) -> Result<String, ApiError>;
    /// Uploads files and creates a scene from them in one request.
    async fn upload_scene(&self, files: &[LocalFile], title: &str) -> Result<Scene, ApiError>;
    async fn download(&self, plan: &DownloadPlan) -> Result<PathBuf, ApiError>;
    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError>;
    fn logout(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

pub struct ReqwestSceneClient {
    client: reqwest::Client,
    base: Url,
    tokens: Arc<dyn TokenStore>,
    downloads: AtomicFileWriter,
}

impl ReqwestSceneClient {
    pub fn new(settings: &ClientSettings, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url).map_err(|err| ApiError::InvalidUrl {
            url: settings.base_url.clone(),
            message: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: settings.base_url.clone(),
                message: "not a hierarchical url".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base,
            tokens,
            downloads: AtomicFileWriter::new(settings.download_dir.clone()),
        })
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                url: self.base.to_string(),
                message: "not a hierarchical url".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Absolute URLs pass through; anything else resolves against the API origin.
    pub fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        Url::parse(url)
            .or_else(|_| self.base.join(url))
            .map_err(|err| ApiError::InvalidUrl {
                url: url.to_string(),
                message: err.to_string(),
            })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match authenticated.then(|| self.tokens.load()).transpose()?.flatten() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        if err.is_unauthorized() {
            scene_warn!("Request rejected with {}; clearing access token", status);
            self.tokens.clear()?;
        }
        Err(err)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        Ok(self.send(request, true).await?.json::<T>().await?)
    }

    async fn send_message(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let value: Value = self.send_json(request).await?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn file_part(file: &LocalFile) -> Result<Part, ApiError> {
        let read_error = |source| ApiError::ReadFile {
            path: file.path.clone(),
            source,
        };
        let handle = tokio::fs::File::open(&file.path).await.map_err(read_error)?;
        let length = handle.metadata().await.map_err(read_error)?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        Ok(Part::stream_with_length(body, length).file_name(file.name.clone()))
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }
}

#[async_trait::async_trait]
impl SceneApi for ReqwestSceneClient {
    async fn list_scenes(&self) -> Result<Vec<Scene>, ApiError> {
        let url = self.endpoint(&["scenes", ""])?;
        let page: ScenesPage = self.send_json(self.client.get(url)).await?;
        scene_debug!("Listed {} of {} scene(s)", page.data.len(), page.count);
        Ok(page.data)
    }

    async fn read_scene(&self, scene_id: &str) -> Result<Scene, ApiError> {
        let url = self.endpoint(&["scenes", scene_id])?;
        self.send_json(self.client.get(url)).await
    }

    async fn create_scene(&self, body: &SceneCreate) -> Result<Scene, ApiError> {
        let url = self.endpoint(&["scenes", ""])?;
        self.send_json(self.client.post(url).json(body)).await
    }

    async fn update_scene(&self, scene_id: &str, body: &SceneUpdate) -> Result<Scene, ApiError> {
        let url = self.endpoint(&["scenes", scene_id])?;
        self.send_json(self.client.put(url).json(body)).await
    }

    async fn delete_scene(&self, scene_id: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["scenes", scene_id])?;
        self.send_message(self.client.delete(url)).await
    }

    async fn delete_all_scenes(&self) -> Result<String, ApiError> {
        let url = self.endpoint(&["scenes", ""])?;
        self.send_message(self.client.delete(url)).await
    }

    async fn upload_scene(&self, files: &[LocalFile], title: &str) -> Result<Scene, ApiError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Self::file_part(file).await?);
        }
        form = form.text("scene_title", title.to_string());
        let url = self.endpoint(&["upload", "scene-with-files"])?;
        scene_info!("Uploading {} file(s) as \"{}\"", files.len(), title);
        self.send_json(self.client.post(url).multipart(form)).await
    }

    async fn download(&self, plan: &DownloadPlan) -> Result<PathBuf, ApiError> {
        let (url, filename) = download_target(plan);
        let url = self.resolve(url)?;
        // Only the API origin gets the bearer token.
        let authenticated = self.same_origin(&url);
        let response = self.send(self.client.get(url), authenticated).await?;
        save_response(response, &self.downloads, &download_filename(filename)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["login", "access-token"])?;
        let form = [("username", username), ("password", password)];
        let response = self.send(self.client.post(url).form(&form), false).await?;
        let token: AccessToken = response.json().await?;
        self.tokens.save(&token.access_token)?;
        scene_info!("Logged in as {}", username);
        Ok(())
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.tokens.clear()?;
        scene_info!("Logged out");
        Ok(())
    }
}
