use std::fmt::Write;

use scene_core::{AppViewModel, DownloadDialogView, HistoryView, SceneCardView, UploadStatus};
use scene_engine::{HeadlessViewer, VolumeSource};

use super::config::Command;

/// Terminal rendering of the part of the view a command is about.
pub fn render(command: &Command, view: &AppViewModel, viewer: &HeadlessViewer) -> String {
    let mut out = String::new();
    match command {
        Command::Login { .. } | Command::Logout => {}
        Command::History { .. } | Command::Delete { .. } | Command::ClearHistory { .. } => {
            render_history(&mut out, &view.history);
        }
        Command::Download { .. } => {
            if let Some(dialog) = &view.download {
                render_download(&mut out, dialog);
            }
        }
        Command::View { .. } => {
            if let Some(outcome) = &view.last_view {
                let _ = writeln!(
                    out,
                    "Scene {}: loaded {} volume(s), skipped {}",
                    outcome.scene_id,
                    outcome.loaded.len(),
                    outcome.skipped
                );
            }
            render_volumes(&mut out, viewer);
        }
        _ => render_workspace(&mut out, view, viewer),
    }
    out
}

fn upload_label(status: &UploadStatus) -> String {
    match status {
        UploadStatus::Idle => "Idle".to_string(),
        UploadStatus::Uploading => "Uploading".to_string(),
        UploadStatus::Processing => "Processing".to_string(),
        UploadStatus::Error(message) => format!("Error: {message}"),
    }
}

fn render_workspace(out: &mut String, view: &AppViewModel, viewer: &HeadlessViewer) {
    let _ = writeln!(
        out,
        "Status: {} | Scene: {} | View: {}",
        upload_label(&view.upload),
        view.scene_id.as_deref().unwrap_or("-"),
        view.view_mode
    );
    if view.images.is_empty() {
        let _ = writeln!(out, "No images attached.");
    }
    for (index, image) in view.images.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3} [{}] #{} {}{}",
            index,
            if image.selected { "x" } else { " " },
            image.id,
            image.name,
            if image.focused { " (focused)" } else { "" }
        );
    }
    let _ = writeln!(
        out,
        "Tool: {}",
        view.selected_tool.as_deref().unwrap_or("none")
    );
    for operation in &view.operations {
        let _ = writeln!(out, "  {operation}");
    }
    if view.submitting {
        let _ = writeln!(out, "Submitting...");
    } else if !view.can_process {
        let _ = writeln!(out, "Select images and a tool to process.");
    }
    render_volumes(out, viewer);
}

fn render_volumes(out: &mut String, viewer: &HeadlessViewer) {
    let _ = writeln!(
        out,
        "Viewer: {} volume(s), slice type {}",
        viewer.volumes().len(),
        viewer.slice_type() as u8
    );
    for volume in viewer.volumes() {
        let source = match &volume.source {
            VolumeSource::File(path) => path.display().to_string(),
            VolumeSource::Url(url) => url.clone(),
        };
        let _ = writeln!(
            out,
            "  {} (opacity {:.0}) {}",
            volume.name, volume.opacity, source
        );
    }
}

fn render_history(out: &mut String, history: &HistoryView) {
    if let Some(error) = &history.error {
        let _ = writeln!(out, "Could not load history: {error}");
    }
    if let Some(summary) = &history.match_summary {
        let _ = writeln!(out, "{summary}");
    }
    if let Some(placeholder) = history.placeholder {
        let _ = writeln!(out, "{placeholder}");
    }
    for card in &history.cards {
        render_card(out, card);
    }
}

fn render_card(out: &mut String, card: &SceneCardView) {
    let mut actions = Vec::new();
    if card.actions.view {
        actions.push("view");
    }
    if card.actions.download {
        actions.push("download");
    }
    if card.actions.delete {
        actions.push("delete");
    }
    let _ = writeln!(
        out,
        "{} {:<10} {:<12} {} ({}) {} image(s) [{}]",
        card.short_id,
        card.status_label,
        card.tool_name,
        card.date,
        card.duration,
        card.image_count,
        actions.join(", ")
    );
    if let Some(error) = &card.error {
        let _ = writeln!(out, "    error: {error}");
    }
    if let Some(details) = &card.details {
        let _ = writeln!(out, "    id: {}", card.id);
        let _ = writeln!(out, "    {}", details.message);
        for name in &details.image_names {
            let _ = writeln!(out, "    - {name}");
        }
    }
}

fn render_download(out: &mut String, dialog: &DownloadDialogView) {
    let _ = writeln!(
        out,
        "Download {} ({}): {} of {} selected",
        dialog.scene_id,
        dialog.tool_name,
        dialog.selected,
        dialog.files.len()
    );
    for row in &dialog.files {
        let _ = writeln!(
            out,
            "  [{}] {:<20} {} ({}, {})",
            if row.selected { "x" } else { " " },
            row.id,
            row.display_name,
            row.kind.label(),
            row.format
        );
    }
    if dialog.downloading {
        let _ = writeln!(out, "Downloading...");
    } else if dialog.as_archive {
        let _ = writeln!(out, "Selected files download as one archive.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::{DownloadFileRow, FileKind, ImageRowView};

    #[test]
    fn workspace_lists_images_and_focus() {
        let view = AppViewModel {
            scene_id: Some("s1".into()),
            images: vec![
                ImageRowView {
                    id: 1,
                    name: "t1.nii".into(),
                    selected: true,
                    focused: false,
                },
                ImageRowView {
                    id: 2,
                    name: "t2.nii".into(),
                    selected: false,
                    focused: true,
                },
            ],
            ..Default::default()
        };
        let text = render(&Command::Images, &view, &HeadlessViewer::new());
        assert!(text.contains("Status: Idle | Scene: s1 | View: axial"));
        assert!(text.contains("  0 [x] #1 t1.nii\n"));
        assert!(text.contains("  1 [ ] #2 t2.nii (focused)"));
        assert!(text.contains("Viewer: 0 volume(s)"));
    }

    #[test]
    fn download_rows_show_ids() {
        let view = AppViewModel {
            download: Some(DownloadDialogView {
                scene_id: "done1".into(),
                tool_name: "niimath".into(),
                files: vec![DownloadFileRow {
                    id: "a-processed".into(),
                    display_name: "a.nii".into(),
                    filename: "a_out.nii".into(),
                    format: "NII".into(),
                    kind: FileKind::Processed,
                    selected: true,
                }],
                selected: 1,
                select_all_label: "Deselect All",
                can_confirm: true,
                downloading: false,
                as_archive: false,
            }),
            ..Default::default()
        };
        let command = Command::Download {
            scene_id: "done1".into(),
            files: Vec::new(),
            all: false,
        };
        let text = render(&command, &view, &HeadlessViewer::new());
        assert!(text.starts_with("Download done1 (niimath): 1 of 1 selected"));
        assert!(text.contains("[x] a-processed"));
    }

    #[test]
    fn history_shows_placeholder_when_empty() {
        let view = AppViewModel {
            history: HistoryView {
                placeholder: Some(scene_core::EMPTY_HISTORY),
                ..Default::default()
            },
            ..Default::default()
        };
        let command = Command::History {
            search: None,
            expand: Vec::new(),
        };
        let text = render(&command, &view, &HeadlessViewer::new());
        assert_eq!(text, format!("{}\n", scene_core::EMPTY_HISTORY));
    }
}
