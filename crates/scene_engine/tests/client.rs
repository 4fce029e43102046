use std::sync::Arc;

use pretty_assertions::assert_eq;
use scene_core::{SceneStatus, SceneUpdate};
use scene_engine::{
    ApiError, ClientSettings, MemoryTokenStore, ReqwestSceneClient, SceneApi, TokenStore,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer, token: Option<&str>) -> (ReqwestSceneClient, Arc<MemoryTokenStore>) {
    scene_logging::initialize_for_tests();
    let tokens = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::default(),
    });
    let settings = ClientSettings {
        base_url: format!("{}/api/v1", server.uri()),
        ..ClientSettings::default()
    };
    let client = ReqwestSceneClient::new(&settings, tokens.clone()).expect("client");
    (client, tokens)
}

#[tokio::test]
async fn list_sends_bearer_token_and_reads_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scenes/"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "s1", "status": "completed", "tool_name": "niimath",
                 "nv_document": {"imageOptionsArray": [{"resultUrl": "/r/1.nii"}]},
                 "owner_id": "u1"},
                {"id": "s2", "status": "archived", "nv_document": null}
            ],
            "count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("tok-1")).await;
    let scenes = client.list_scenes().await.expect("list");
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].status, SceneStatus::Completed);
    assert_eq!(scenes[0].extra.get("owner_id"), Some(&json!("u1")));
    assert_eq!(scenes[1].status, SceneStatus::Unknown);
}

#[tokio::test]
async fn update_puts_partial_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/scenes/s1"))
        .and(body_json(json!({"tool_name": "niimath", "status": "processing"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "s1", "status": "processing", "nv_document": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, None).await;
    let body = SceneUpdate {
        tool_name: Some("niimath".into()),
        status: Some(SceneStatus::Processing),
        ..SceneUpdate::default()
    };
    let scene = client.update_scene("s1", &body).await.expect("update");
    assert_eq!(scene.status, SceneStatus::Processing);
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scenes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Scene not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/scenes/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "nv_document"], "msg": "field required", "type": "missing"}]
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, None).await;
    let err = client.read_scene("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 404, .. }));
    assert_eq!(err.user_message(), "Scene not found");

    let body = scene_core::SceneCreate {
        nv_document: json!({}),
        tool_name: None,
        status: SceneStatus::Pending,
        parameters: None,
    };
    let err = client.create_scene(&body).await.unwrap_err();
    assert_eq!(err.user_message(), "field required");
}

#[tokio::test]
async fn unauthorized_clears_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scenes/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server, Some("stale")).await;
    let err = client.list_scenes().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(tokens.load().unwrap(), None);
}

#[tokio::test]
async fn delete_all_returns_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/scenes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Deleted 3 scenes"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, None).await;
    assert_eq!(client.delete_all_scenes().await.unwrap(), "Deleted 3 scenes");
}

#[tokio::test]
async fn upload_sends_files_and_title_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload/scene-with-files"))
        .and(body_string_contains("name=\"scene_title\""))
        .and(body_string_contains("Upload Scene - 5/1/2024"))
        .and(body_string_contains("filename=\"t1.nii\""))
        .and(body_string_contains("voxels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s9",
            "status": "pending",
            "nv_document": {"imageOptionsArray": [
                {"name": "t1.nii", "url": "/static/uploads/abc.nii", "colormap": "gray", "opacity": 1}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("t1.nii");
    std::fs::write(&path, b"voxels").unwrap();

    let (client, _) = client_for(&server, None).await;
    let files = vec![scene_core::LocalFile::from_path(path)];
    let scene = client
        .upload_scene(&files, "Upload Scene - 5/1/2024, 12:00:00 PM")
        .await
        .expect("upload");
    assert_eq!(scene.id, "s9");
}

#[tokio::test]
async fn upload_of_missing_file_fails_before_sending() {
    let server = MockServer::start().await;
    let (client, _) = client_for(&server, None).await;
    let files = vec![scene_core::LocalFile::from_path("/definitely/not/here.nii".into())];
    let err = client.upload_scene(&files, "t").await.unwrap_err();
    assert!(matches!(err, ApiError::ReadFile { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn login_stores_token_and_logout_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login/access-token"))
        .and(body_string_contains("username=a%40b.c"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server, None).await;
    client.login("a@b.c", "secret123").await.expect("login");
    assert_eq!(tokens.load().unwrap().as_deref(), Some("fresh"));

    client.logout().unwrap();
    assert_eq!(tokens.load().unwrap(), None);
}

#[test]
fn rejects_unusable_base_url() {
    let settings = ClientSettings {
        base_url: "mailto:someone@example.com".into(),
        ..ClientSettings::default()
    };
    let tokens = Arc::new(MemoryTokenStore::default());
    assert!(matches!(
        ReqwestSceneClient::new(&settings, tokens),
        Err(ApiError::InvalidUrl { .. })
    ));
}
