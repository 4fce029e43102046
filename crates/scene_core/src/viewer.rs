use std::fmt;
use std::str::FromStr;

/// Slice layout understood by the volumetric viewer widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SliceType {
    #[default]
    Axial = 0,
    Coronal = 1,
    Sagittal = 2,
    Multiplanar = 3,
    Render = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Axial,
    Coronal,
    Sagittal,
    Multi,
    Render,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Axial,
        ViewMode::Coronal,
        ViewMode::Sagittal,
        ViewMode::Multi,
        ViewMode::Render,
    ];

    pub fn slice_type(self) -> SliceType {
        match self {
            ViewMode::Axial => SliceType::Axial,
            ViewMode::Coronal => SliceType::Coronal,
            ViewMode::Sagittal => SliceType::Sagittal,
            ViewMode::Multi => SliceType::Multiplanar,
            ViewMode::Render => SliceType::Render,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Axial => "axial",
            ViewMode::Coronal => "coronal",
            ViewMode::Sagittal => "sagittal",
            ViewMode::Multi => "multi",
            ViewMode::Render => "render",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised names fall back to axial, like the widget does.
impl FromStr for ViewMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ViewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_default())
    }
}
