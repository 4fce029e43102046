use std::path::PathBuf;

use scene_core::{local_volume_id, LocalImage, LocalImageId, SliceType};
use scene_logging::{scene_debug, scene_warn};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("viewer is not attached to a canvas")]
    Detached,
    #[error("no volume at index {0}")]
    NoSuchVolume(usize),
    #[error("volume {0} already loaded")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub source: VolumeSource,
    pub opacity: f32,
}

impl Volume {
    pub fn from_file(id: impl Into<String>, name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: VolumeSource::File(path),
            opacity: 1.0,
        }
    }
}

/// The commands the client issues against a volume viewer.
pub trait VolumeViewer {
    fn attach_to_canvas(&mut self, canvas: &str) -> Result<(), ViewerError>;
    fn add_volume_from_url(&mut self, url: &str, name: &str) -> Result<(), ViewerError>;
    fn add_volume(&mut self, volume: Volume) -> Result<(), ViewerError>;
    fn set_slice_type(&mut self, slice_type: SliceType);
    fn set_opacity(&mut self, index: usize, opacity: f32) -> Result<(), ViewerError>;
    fn remove_volume_by_index(&mut self, index: usize) -> Result<(), ViewerError>;
    fn get_volume_index_by_id(&self, id: &str) -> Option<usize>;
    fn update_gl_volume(&mut self);
}

/// Viewer without a display: keeps the volume list and render settings so
/// the rest of the client can be driven and inspected from a terminal.
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewer {
    canvas: Option<String>,
    volumes: Vec<Volume>,
    slice_type: SliceType,
    redraws: u32,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas(&self) -> Option<&str> {
        self.canvas.as_deref()
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn slice_type(&self) -> SliceType {
        self.slice_type
    }

    pub fn redraws(&self) -> u32 {
        self.redraws
    }

    fn ensure_attached(&self) -> Result<(), ViewerError> {
        self.canvas.as_ref().map(|_| ()).ok_or(ViewerError::Detached)
    }
}

impl VolumeViewer for HeadlessViewer {
    fn attach_to_canvas(&mut self, canvas: &str) -> Result<(), ViewerError> {
        self.canvas = Some(canvas.to_string());
        Ok(())
    }

    fn add_volume_from_url(&mut self, url: &str, name: &str) -> Result<(), ViewerError> {
        self.ensure_attached()?;
        // URL volumes are keyed by their source; loading the same result twice adds it twice.
        self.volumes.push(Volume {
            id: url.to_string(),
            name: name.to_string(),
            source: VolumeSource::Url(url.to_string()),
            opacity: 1.0,
        });
        Ok(())
    }

    fn add_volume(&mut self, volume: Volume) -> Result<(), ViewerError> {
        self.ensure_attached()?;
        if self.get_volume_index_by_id(&volume.id).is_some() {
            return Err(ViewerError::Duplicate(volume.id));
        }
        self.volumes.push(volume);
        Ok(())
    }

    fn set_slice_type(&mut self, slice_type: SliceType) {
        self.slice_type = slice_type;
    }

    fn set_opacity(&mut self, index: usize, opacity: f32) -> Result<(), ViewerError> {
        let volume = self
            .volumes
            .get_mut(index)
            .ok_or(ViewerError::NoSuchVolume(index))?;
        volume.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    fn remove_volume_by_index(&mut self, index: usize) -> Result<(), ViewerError> {
        if index >= self.volumes.len() {
            return Err(ViewerError::NoSuchVolume(index));
        }
        self.volumes.remove(index);
        Ok(())
    }

    fn get_volume_index_by_id(&self, id: &str) -> Option<usize> {
        self.volumes.iter().position(|volume| volume.id == id)
    }

    fn update_gl_volume(&mut self) {
        self.redraws += 1;
    }
}

/// Single owner of the viewer, handed to whoever executes viewer effects.
pub struct ViewerSession<V: VolumeViewer> {
    viewer: V,
}

impl<V: VolumeViewer> ViewerSession<V> {
    pub fn new(mut viewer: V, canvas: &str) -> Result<Self, ViewerError> {
        viewer.attach_to_canvas(canvas)?;
        Ok(Self { viewer })
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    /// Adds local images not yet known to the viewer.
    pub fn attach_local(&mut self, images: &[LocalImage]) -> Result<usize, ViewerError> {
        let mut added = 0;
        for image in images {
            let id = image.volume_id();
            if self.viewer.get_volume_index_by_id(&id).is_some() {
                continue;
            }
            self.viewer
                .add_volume(Volume::from_file(id, image.name.clone(), image.path.clone()))?;
            added += 1;
        }
        Ok(added)
    }

    pub fn load_result(&mut self, url: &str, name: &str) -> Result<(), ViewerError> {
        scene_debug!("Adding volume {} from {}", name, url);
        self.viewer.add_volume_from_url(url, name)
    }

    pub fn set_slice_type(&mut self, slice_type: SliceType) {
        self.viewer.set_slice_type(slice_type);
    }

    /// Full opacity for `visible`, zero for every id in `hidden`, then redraw.
    pub fn show_only(
        &mut self,
        visible: LocalImageId,
        hidden: &[LocalImageId],
    ) -> Result<(), ViewerError> {
        let targets = std::iter::once((visible, 1.0)).chain(hidden.iter().map(|id| (*id, 0.0)));
        for (image_id, opacity) in targets {
            let volume_id = local_volume_id(image_id);
            match self.viewer.get_volume_index_by_id(&volume_id) {
                Some(index) => self.viewer.set_opacity(index, opacity)?,
                None => scene_warn!("Volume {} is not loaded; skipping opacity", volume_id),
            }
        }
        self.viewer.update_gl_volume();
        Ok(())
    }
}
