use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use scene_core::{DownloadPlan, LocalFile, Scene, SceneCreate, SceneUpdate};
use scene_engine::{ApiError, ApiReply, EngineCommand, EngineEvent, EngineHandle, SceneApi};

/// Records calls and answers from canned data.
#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait::async_trait]
impl SceneApi for FakeApi {
    async fn list_scenes(&self) -> Result<Vec<Scene>, ApiError> {
        self.record("list");
        Ok(vec![Scene::new("s1"), Scene::new("s2")])
    }

    async fn read_scene(&self, scene_id: &str) -> Result<Scene, ApiError> {
        self.record(format!("read {scene_id}"));
        Err(ApiError::HttpStatus {
            status: 404,
            detail: "Scene not found".into(),
        })
    }

    async fn create_scene(&self, _body: &SceneCreate) -> Result<Scene, ApiError> {
        self.record("create");
        Ok(Scene::new("new"))
    }

    async fn update_scene(&self, scene_id: &str, _body: &SceneUpdate) -> Result<Scene, ApiError> {
        self.record(format!("update {scene_id}"));
        Ok(Scene::new(scene_id))
    }

    async fn delete_scene(&self, scene_id: &str) -> Result<String, ApiError> {
        self.record(format!("delete {scene_id}"));
        Ok("deleted".into())
    }

    async fn delete_all_scenes(&self) -> Result<String, ApiError> {
        self.record("delete all");
        Err(ApiError::Unauthorized { status: 401 })
    }

    async fn upload_scene(&self, files: &[LocalFile], _title: &str) -> Result<Scene, ApiError> {
        self.record(format!("upload {}", files.len()));
        Ok(Scene::new("up"))
    }

    async fn download(&self, _plan: &DownloadPlan) -> Result<PathBuf, ApiError> {
        self.record("download");
        Ok(PathBuf::from("downloads/x.nii"))
    }

    async fn login(&self, username: &str, _password: &str) -> Result<(), ApiError> {
        self.record(format!("login {username}"));
        Ok(())
    }

    fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

fn completed(engine: &EngineHandle) -> (u64, Result<ApiReply, ApiError>) {
    match engine.recv().expect("engine alive") {
        EngineEvent::RequestCompleted { request_id, result } => (request_id, result),
    }
}

#[test]
fn commands_complete_with_matching_request_ids() {
    scene_logging::initialize_for_tests();
    let api = Arc::new(FakeApi::default());
    let engine = EngineHandle::new(api.clone());

    let list = engine.submit(EngineCommand::ListScenes);
    let (request_id, result) = completed(&engine);
    assert_eq!(request_id, list);
    match result {
        Ok(ApiReply::Scenes(scenes)) => assert_eq!(scenes.len(), 2),
        other => panic!("unexpected {other:?}"),
    }

    let read = engine.submit(EngineCommand::ReadScene {
        scene_id: "gone".into(),
    });
    let (request_id, result) = completed(&engine);
    assert_eq!(request_id, read);
    assert_eq!(result.unwrap_err().user_message(), "Scene not found");

    engine.submit(EngineCommand::DeleteAllScenes);
    let (_, result) = completed(&engine);
    assert!(result.unwrap_err().is_unauthorized());

    assert_eq!(
        *api.calls.lock().unwrap(),
        vec!["list".to_string(), "read gone".to_string(), "delete all".to_string()]
    );
}

#[test]
fn request_ids_increase() {
    let engine = EngineHandle::new(Arc::new(FakeApi::default()));
    let first = engine.submit(EngineCommand::DeleteScene {
        scene_id: "a".into(),
    });
    let second = engine.submit(EngineCommand::Login {
        username: "u".into(),
        password: "p".into(),
    });
    assert!(second > first);
    let mut seen = vec![completed(&engine).0, completed(&engine).0];
    seen.sort_unstable();
    assert_eq!(seen, vec![first, second]);
}
