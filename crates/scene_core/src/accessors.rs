//! Safe getters over loosely-typed scene and image records.
//!
//! Nothing in here fails: missing nested objects, wrong JSON types and blank
//! strings all degrade to an empty sequence, an empty string or a caller
//! supplied fallback.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::scene::{Scene, SceneStatus};

/// Name-like image fields, in priority order.
pub const DISPLAY_NAME_FIELDS: [&str; 7] = [
    "name",
    "originalName",
    "processedName",
    "filename",
    "title",
    "displayName",
    "label",
];

/// URL-like image fields, in priority order.
pub const URL_FIELDS: [&str; 4] = ["resultUrl", "url", "downloadUrl", "src"];

fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().filter(|text| !text.trim().is_empty())
}

fn first_non_blank<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| record.get(*key).and_then(non_blank))
}

/// Returns a direct property of `scene` as text, or `fallback` when it is
/// absent, blank or not a string.
pub fn scene_property<'a>(scene: &'a Scene, key: &str, fallback: &'a str) -> &'a str {
    let value = match key {
        "id" => Some(scene.id.as_str()),
        "tool_name" => scene.tool_name.as_deref(),
        "status" => match scene.status {
            SceneStatus::Unknown => None,
            status => Some(status.as_str()),
        },
        "timestamp" => scene.timestamp.as_deref(),
        "error" => scene.error.as_deref(),
        other => scene.extra.get(other).and_then(Value::as_str),
    };
    value
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(fallback)
}

pub fn image_property<'a>(image: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    image.get(key).and_then(non_blank).unwrap_or(fallback)
}

/// The scene's `nv_document.imageOptionsArray`, or an empty slice.
pub fn image_array(scene: &Scene) -> &[Value] {
    scene
        .nv_document
        .get("imageOptionsArray")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn image_count(scene: &Scene) -> usize {
    image_array(scene).len()
}

pub fn has_images(scene: &Scene) -> bool {
    image_count(scene) > 0
}

pub fn image_display_name(image: &Value, index: usize) -> String {
    first_non_blank(image, &DISPLAY_NAME_FIELDS)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("Image {}", index + 1))
}

pub fn image_id(image: &Value, index: usize) -> String {
    match image.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("image-{index}"),
    }
}

/// Best available location for an image, or an empty string.
pub fn image_url(image: &Value) -> &str {
    first_non_blank(image, &URL_FIELDS).unwrap_or("")
}

/// Processed output location; only set once the scene completed.
pub fn result_url(image: &Value) -> Option<&str> {
    image.get("resultUrl").and_then(non_blank)
}

/// Every non-blank string that free-text search looks at.
pub fn searchable_text(scene: &Scene) -> Vec<String> {
    let mut texts = Vec::new();

    for key in ["id", "tool_name", "status", "error", "timestamp"] {
        let value = scene_property(scene, key, "");
        if !value.is_empty() {
            texts.push(value.to_owned());
        }
    }
    texts.extend(scene.extra.values().filter_map(non_blank).map(ToOwned::to_owned));

    for (index, image) in image_array(scene).iter().enumerate() {
        texts.push(image_display_name(image, index));
        if let Some(fields) = image.as_object() {
            texts.extend(fields.values().filter_map(non_blank).map(ToOwned::to_owned));
        }
    }

    if let Some(Value::Object(result)) = &scene.result {
        texts.extend(result.values().filter_map(non_blank).map(ToOwned::to_owned));
    }

    texts
}

/// Case-insensitive substring search; an empty query matches everything.
/// Whitespace is part of the query.
pub fn matches_query(scene: &Scene, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    searchable_text(scene)
        .iter()
        .any(|text| text.to_lowercase().contains(&query))
}

/// Accepts RFC 3339 and the backend's naive ISO timestamps (read as UTC).
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(timestamp, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_duration(start: &str, now: DateTime<Utc>) -> String {
    let seconds = parse_timestamp(start)
        .map(|started| (now - started).num_seconds().max(0))
        .unwrap_or(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}

pub fn format_date(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(date) => date.format("%b %-d, %-I:%M %p").to_string(),
        None => "Unknown date".to_string(),
    }
}

pub fn processing_message(scene: &Scene, now: DateTime<Utc>) -> String {
    let timestamp = scene_property(scene, "timestamp", "");
    if timestamp.is_empty() {
        return "Processing status unknown".to_string();
    }
    let count = image_count(scene);
    let tool = scene_property(scene, "tool_name", "Unknown Tool");
    match scene.status {
        SceneStatus::Pending | SceneStatus::Processing => {
            format!("Processing {count} image(s) with {tool}...")
        }
        SceneStatus::Completed => format!(
            "Successfully processed {count} image(s) in {}",
            format_duration(timestamp, now)
        ),
        SceneStatus::Failed => format!(
            "Failed to process {count} image(s). Please check your inputs and try again."
        ),
        SceneStatus::Unknown => "Processing status unknown".to_string(),
    }
}

/// Last path segment of a URL, ignoring any query or fragment.
pub fn final_path_segment(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(last) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return last.to_string();
        }
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn scene_with_document(document: Value) -> Scene {
        let mut scene = Scene::new("s1");
        scene.nv_document = document;
        scene
    }

    #[test]
    fn malformed_image_arrays_read_as_empty() {
        for document in [
            Value::Null,
            json!({}),
            json!({"imageOptionsArray": null}),
            json!({"imageOptionsArray": "nope"}),
            json!({"imageOptionsArray": {"0": {}}}),
            json!(["not", "an", "object"]),
        ] {
            let scene = scene_with_document(document);
            assert!(image_array(&scene).is_empty());
            assert_eq!(image_count(&scene), 0);
            assert!(!has_images(&scene));
        }
    }

    #[test]
    fn display_name_follows_priority_then_placeholder() {
        let image = json!({"label": "L", "title": "T", "name": "  "});
        assert_eq!(image_display_name(&image, 0), "T");
        assert_eq!(image_display_name(&json!({"name": 7}), 2), "Image 3");
        assert_eq!(image_display_name(&Value::Null, 0), "Image 1");
        assert_eq!(image_display_name(&json!("string record"), 4), "Image 5");
    }

    #[test]
    fn url_follows_priority() {
        let image = json!({"src": "s", "url": "u", "resultUrl": ""});
        assert_eq!(image_url(&image), "u");
        assert_eq!(image_url(&json!({})), "");
        assert_eq!(result_url(&image), None);
    }

    #[test]
    fn image_id_accepts_numbers_and_falls_back_to_index() {
        assert_eq!(image_id(&json!({"id": "abc"}), 0), "abc");
        assert_eq!(image_id(&json!({"id": 12}), 0), "12");
        assert_eq!(image_id(&json!({}), 3), "image-3");
    }

    #[test]
    fn scene_property_uses_fallback_for_blank_values() {
        let mut scene = Scene::new("s1");
        scene.tool_name = Some(" ".into());
        scene.extra.insert("owner_id".into(), json!("u1"));
        scene.extra.insert("count".into(), json!(3));
        assert_eq!(scene_property(&scene, "tool_name", "Unknown Tool"), "Unknown Tool");
        assert_eq!(scene_property(&scene, "owner_id", ""), "u1");
        assert_eq!(scene_property(&scene, "count", "n/a"), "n/a");
        assert_eq!(scene_property(&scene, "status", ""), "pending");
    }

    #[test]
    fn searchable_text_collects_scene_image_and_result_strings() {
        let mut scene = scene_with_document(json!({
            "imageOptionsArray": [
                {"name": "brain.nii", "url": "/u/brain.nii", "opacity": 1},
                {"colormap": "gray"}
            ]
        }));
        scene.tool_name = Some("niimath".into());
        scene.result = Some(json!({"message": "done", "count": 2}));

        let texts = searchable_text(&scene);
        for expected in ["s1", "niimath", "pending", "brain.nii", "/u/brain.nii", "Image 2", "gray", "done"] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected}");
        }
        assert!(texts.iter().all(|t| !t.trim().is_empty()));
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        let mut scene = Scene::new("abc");
        scene.tool_name = Some("niimath".into());
        assert!(matches_query(&scene, ""));
        assert!(!matches_query(&scene, "   "));
        assert!(!matches_query(&scene, " niimath"));
        assert!(matches_query(&scene, "NiiMath"));
        assert!(!matches_query(&scene, "fsl"));
    }

    #[test]
    fn duration_formats_seconds_and_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 5).unwrap();
        assert_eq!(format_duration("2024-05-01T12:01:50", now), "15s");
        assert_eq!(format_duration("2024-05-01T12:00:00+00:00", now), "2m 5s");
        assert_eq!(format_duration("garbage", now), "0s");
        assert_eq!(format_duration("2024-05-01T13:00:00", now), "0s");
    }

    #[test]
    fn date_formatting_tolerates_garbage() {
        assert_eq!(format_date("2024-05-01T15:04:00.123456"), "May 1, 3:04 PM");
        assert_eq!(format_date(""), "Unknown date");
    }

    #[test]
    fn processing_message_depends_on_status() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap();
        let mut scene = scene_with_document(json!({"imageOptionsArray": [{}, {}]}));
        assert_eq!(processing_message(&scene, now), "Processing status unknown");

        scene.timestamp = Some("2024-05-01T12:00:00".into());
        assert_eq!(
            processing_message(&scene, now),
            "Processing 2 image(s) with Unknown Tool..."
        );
        scene.status = SceneStatus::Completed;
        assert_eq!(
            processing_message(&scene, now),
            "Successfully processed 2 image(s) in 30s"
        );
        scene.status = SceneStatus::Failed;
        assert!(processing_message(&scene, now).starts_with("Failed to process 2 image(s)"));
    }

    #[test]
    fn final_segment_handles_relative_and_absolute_urls() {
        assert_eq!(final_path_segment("/r/1.nii"), "1.nii");
        assert_eq!(final_path_segment("http://host/static/out.nii.gz?x=1"), "out.nii.gz");
        assert_eq!(final_path_segment("plain.nii"), "plain.nii");
        assert_eq!(final_path_segment("/r/dir/"), "dir");
    }
}
