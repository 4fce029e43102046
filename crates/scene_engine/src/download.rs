use std::path::PathBuf;

use futures_util::StreamExt;
use scene_core::DownloadPlan;
use scene_logging::{scene_debug, scene_info};

use crate::persist::AtomicFileWriter;
use crate::types::ApiError;

/// Source URL and suggested local name for a download plan.
pub fn download_target(plan: &DownloadPlan) -> (&str, &str) {
    match plan {
        DownloadPlan::Single { url, filename } => (url.as_str(), filename.as_str()),
        DownloadPlan::Batch {
            scene_id,
            url,
            archive_name,
            file_ids,
        } => {
            scene_debug!(
                "Batch download for scene {}: {}",
                scene_id,
                file_ids.join(", ")
            );
            (url.as_str(), archive_name.as_str())
        }
    }
}

/// Streams a response body into `filename`; nothing is left behind on error.
pub(crate) async fn save_response(
    response: reqwest::Response,
    writer: &AtomicFileWriter,
    filename: &str,
) -> Result<PathBuf, ApiError> {
    let mut staged = writer.stage(filename)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        staged.append(&chunk?)?;
    }
    let bytes = staged.bytes_written();
    let path = staged.commit()?;
    scene_info!("Saved {} ({} bytes)", path.display(), bytes);
    Ok(path)
}
