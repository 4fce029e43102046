use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::accessors::{
    final_path_segment, image_array, image_display_name, image_id, result_url, scene_property,
};
use crate::scene::{Scene, SceneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Original,
    Processed,
}

impl FileKind {
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Original => "Original",
            FileKind::Processed => "Processed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadableFile {
    pub id: String,
    pub display_name: String,
    pub filename: String,
    pub url: String,
    pub kind: FileKind,
}

impl DownloadableFile {
    pub fn format(&self) -> &str {
        file_format(&self.filename)
    }
}

/// Extension of `filename`, treating `.nii.gz` as one format.
pub fn file_format(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".nii.gz") {
        return "nii.gz";
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "unknown",
    }
}

fn original_source(image: &Value) -> Option<&str> {
    ["url", "downloadUrl", "src"]
        .iter()
        .find_map(|key| image.get(*key).and_then(Value::as_str))
        .filter(|url| !url.trim().is_empty())
}

fn named<'a>(image: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| image.get(*key).and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
}

/// Files one image record can offer: its original upload and, once
/// processed, its result.
pub fn downloadable_files(image: &Value, index: usize) -> Vec<DownloadableFile> {
    let id = image_id(image, index);
    let display_name = image_display_name(image, index);
    let mut files = Vec::with_capacity(2);

    if let Some(url) = original_source(image) {
        let filename = named(image, &["originalName", "name", "filename"])
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| final_path_segment(url));
        files.push(DownloadableFile {
            id: format!("{id}-original"),
            display_name: display_name.clone(),
            filename,
            url: url.to_string(),
            kind: FileKind::Original,
        });
    }

    if let Some(url) = result_url(image) {
        let filename = named(image, &["processedName"])
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| final_path_segment(url));
        files.push(DownloadableFile {
            id: format!("{id}-processed"),
            display_name: format!("{display_name} (processed)"),
            filename,
            url: url.to_string(),
            kind: FileKind::Processed,
        });
    }

    files
}

pub fn scene_downloadable_files(scene: &Scene) -> Vec<DownloadableFile> {
    image_array(scene)
        .iter()
        .enumerate()
        .flat_map(|(index, image)| downloadable_files(image, index))
        .collect()
}

/// What a confirmed download dialog asks the platform to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPlan {
    Single {
        url: String,
        filename: String,
    },
    Batch {
        scene_id: SceneId,
        url: String,
        archive_name: String,
        file_ids: Vec<String>,
    },
}

pub fn batch_archive_url(scene_id: &str) -> String {
    format!("/downloads/{scene_id}/batch_download.zip")
}

pub fn batch_archive_name(scene: &Scene, today: NaiveDate) -> String {
    format!(
        "{}_results_{}.zip",
        scene_property(scene, "tool_name", "processing"),
        today.format("%Y-%m-%d")
    )
}

/// State of the download dialog for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSelection {
    scene: Scene,
    files: Vec<DownloadableFile>,
    selected: BTreeSet<String>,
    downloading: bool,
}

impl DownloadSelection {
    pub fn new(scene: Scene) -> Self {
        let files = scene_downloadable_files(&scene);
        Self {
            scene,
            files,
            selected: BTreeSet::new(),
            downloading: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn files(&self) -> &[DownloadableFile] {
        &self.files
    }

    pub fn is_selected(&self, file_id: &str) -> bool {
        self.selected.contains(file_id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn all_selected(&self) -> bool {
        !self.files.is_empty() && self.selected.len() == self.files.len()
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn can_confirm(&self) -> bool {
        !self.selected.is_empty() && !self.downloading
    }

    /// Returns false when `file_id` is not offered by this dialog.
    pub fn toggle(&mut self, file_id: &str) -> bool {
        if !self.files.iter().any(|file| file.id == file_id) {
            return false;
        }
        if !self.selected.remove(file_id) {
            self.selected.insert(file_id.to_string());
        }
        true
    }

    /// Selects everything unless everything is already selected.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.files.iter().map(|file| file.id.clone()).collect();
        }
    }

    /// `None` when nothing is selected.
    pub fn plan(&self, today: NaiveDate) -> Option<DownloadPlan> {
        let chosen: Vec<&DownloadableFile> = self
            .files
            .iter()
            .filter(|file| self.selected.contains(&file.id))
            .collect();
        match chosen.as_slice() {
            [] => None,
            [file] => Some(DownloadPlan::Single {
                url: file.url.clone(),
                filename: file.filename.clone(),
            }),
            many => Some(DownloadPlan::Batch {
                scene_id: self.scene.id.clone(),
                url: batch_archive_url(&self.scene.id),
                archive_name: batch_archive_name(&self.scene, today),
                file_ids: many.iter().map(|file| file.id.clone()).collect(),
            }),
        }
    }

    pub(crate) fn set_downloading(&mut self, downloading: bool) {
        self.downloading = downloading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed_scene() -> Scene {
        let mut scene = Scene::new("s9");
        scene.tool_name = Some("niimath".into());
        scene.nv_document = json!({
            "imageOptionsArray": [
                {"id": "a", "name": "t1.nii.gz", "url": "/u/t1.nii.gz", "resultUrl": "/r/t1_ceil.nii.gz"},
                {"name": "t2.dcm", "resultUrl": "/r/t2_ceil.dcm"},
                {"name": "nothing-here"}
            ]
        });
        scene
    }

    #[test]
    fn files_cover_original_and_processed_variants() {
        let files = scene_downloadable_files(&completed_scene());
        let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a-original", "a-processed", "image-1-processed"]);
        assert_eq!(files[0].filename, "t1.nii.gz");
        assert_eq!(files[0].format(), "nii.gz");
        assert_eq!(files[1].filename, "t1_ceil.nii.gz");
        assert_eq!(files[2].format(), "dcm");
        assert_eq!(files[2].kind, FileKind::Processed);
    }

    #[test]
    fn format_detection() {
        assert_eq!(file_format("a.NII.GZ"), "nii.gz");
        assert_eq!(file_format("scan.mgz"), "mgz");
        assert_eq!(file_format("README"), "unknown");
        assert_eq!(file_format(".hidden"), "unknown");
    }

    #[test]
    fn select_all_toggles_between_all_and_none() {
        let mut selection = DownloadSelection::new(completed_scene());
        assert!(!selection.can_confirm());
        selection.toggle_all();
        assert_eq!(selection.selected_count(), 3);
        assert!(selection.all_selected());
        selection.toggle_all();
        assert_eq!(selection.selected_count(), 0);

        assert!(selection.toggle("a-original"));
        selection.toggle_all();
        assert_eq!(selection.selected_count(), 3);
        assert!(!selection.toggle("missing"));
    }

    #[test]
    fn plan_depends_on_selection_size() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut selection = DownloadSelection::new(completed_scene());
        assert_eq!(selection.plan(today), None);

        selection.toggle("a-processed");
        assert_eq!(
            selection.plan(today),
            Some(DownloadPlan::Single {
                url: "/r/t1_ceil.nii.gz".into(),
                filename: "t1_ceil.nii.gz".into(),
            })
        );

        selection.toggle("a-original");
        match selection.plan(today) {
            Some(DownloadPlan::Batch {
                url, archive_name, file_ids, ..
            }) => {
                assert_eq!(url, "/downloads/s9/batch_download.zip");
                assert_eq!(archive_name, "niimath_results_2024-05-01.zip");
                assert_eq!(file_ids.len(), 2);
            }
            other => panic!("expected batch plan, got {other:?}"),
        }
    }
}
