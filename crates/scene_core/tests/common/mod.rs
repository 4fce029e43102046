#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use scene_core::{update, AppState, Effect, LocalFile, Msg, Scene, SceneStatus};
use serde_json::{json, Value};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scene_logging::initialize_for_tests);
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap()
}

pub fn local_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn files(names: &[&str]) -> Vec<LocalFile> {
    names
        .iter()
        .map(|name| LocalFile::from_path(PathBuf::from(format!("/data/{name}"))))
        .collect()
}

pub fn scene(id: &str, status: SceneStatus, document: Value) -> Scene {
    let mut value = json!({
        "id": id,
        "status": status.as_str(),
        "tool_name": "niimath",
        "timestamp": "2024-05-01T12:00:00",
        "nv_document": document,
    });
    if status == SceneStatus::Failed {
        value["error"] = json!("niimath exited with 1");
    }
    serde_json::from_value(value).expect("scene fixture")
}

/// Runs a sequence of messages, returning the final state and every effect.
pub fn run(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    msgs.into_iter().fold((state, Vec::new()), |(state, mut all), msg| {
        let (state, effects) = update(state, msg);
        all.extend(effects);
        (state, all)
    })
}

pub fn with_history(scenes: Vec<Scene>) -> AppState {
    let (state, _) = run(
        AppState::new(),
        vec![
            Msg::HistoryRequested,
            Msg::ScenesLoaded { result: Ok(scenes) },
        ],
    );
    state
}
