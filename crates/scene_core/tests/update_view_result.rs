mod common;

use pretty_assertions::assert_eq;
use scene_core::{update, AppState, Effect, Msg, SceneStatus, ViewOutcome, NO_IMAGE_OPTIONS};
use serde_json::json;

use common::{init_logging, now, scene};

fn load(scene: scene_core::Scene) -> (AppState, Vec<Effect>) {
    let (state, effects) = update(
        AppState::new(),
        Msg::ViewResultClicked {
            scene_id: scene.id.clone(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchScene {
            scene_id: scene.id.clone()
        }]
    );
    assert!(state.is_busy());
    update(state, Msg::ResultSceneLoaded { result: Ok(scene) })
}

#[test]
fn every_result_url_becomes_one_volume() {
    init_logging();
    let (state, effects) = load(scene(
        "s1",
        SceneStatus::Completed,
        json!({"imageOptionsArray": [
            {"name": "a.nii", "resultUrl": "http://h/static/results/a_out.nii.gz"},
            {"name": "b.nii"},
            {"name": "c.nii", "resultUrl": "/static/results/c_out.nii?token=1"}
        ]}),
    ));

    assert_eq!(
        effects,
        vec![
            Effect::LoadVolume {
                url: "http://h/static/results/a_out.nii.gz".into(),
                name: "a_out.nii.gz".into(),
            },
            Effect::LoadVolume {
                url: "/static/results/c_out.nii?token=1".into(),
                name: "c_out.nii".into(),
            },
        ]
    );
    assert!(!state.is_busy());
    assert_eq!(
        state.view(now()).last_view,
        Some(ViewOutcome {
            scene_id: "s1".into(),
            loaded: vec!["a_out.nii.gz".into(), "c_out.nii".into()],
            skipped: 1,
        })
    );
}

#[test]
fn scene_error_is_alerted_before_loading() {
    let mut result = scene(
        "s2",
        SceneStatus::Completed,
        json!({"imageOptionsArray": [{"resultUrl": "/r/x.nii"}]}),
    );
    result.error = Some("partial output".into());
    let (_, effects) = load(result);
    assert_eq!(
        effects,
        vec![
            Effect::Alert("Process returned error message partial output".into()),
            Effect::LoadVolume {
                url: "/r/x.nii".into(),
                name: "x.nii".into(),
            },
        ]
    );
}

#[test]
fn missing_image_array_is_reported() {
    init_logging();
    let (state, effects) = load(scene("s3", SceneStatus::Completed, json!({"title": "t"})));
    assert_eq!(effects, vec![Effect::Alert(NO_IMAGE_OPTIONS.to_string())]);
    assert_eq!(state.view(now()).last_view, None);
}

#[test]
fn unfinished_scenes_are_not_loaded() {
    let (_, effects) = load(scene("s4", SceneStatus::Processing, json!({})));
    assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("processing")));
}

#[test]
fn read_failure_alerts() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::ViewResultClicked {
            scene_id: "gone".into(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::ResultSceneLoaded {
            result: Err("Scene not found".into()),
        },
    );
    assert_eq!(effects, vec![Effect::Alert("Scene not found".into())]);
    assert!(!state.is_busy());
}
