use std::fmt;
use std::fs;
use std::str::FromStr;

use crate::services::media::{MediaStore, RequestOrigin};

use super::types::StlError;

/// How extracted meshes are laid out under the STL media area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StlLayout {
    /// `stl_files/<name>`, shared by every examination.
    Flat,
    /// `stl_files/<examination_id>/<name>`.
    #[default]
    PerExamination,
}

impl FromStr for StlLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(StlLayout::Flat),
            "per_examination" | "per-examination" => Ok(StlLayout::PerExamination),
            other => Err(format!(
                "unknown layout '{other}', expected 'flat' or 'per_examination'"
            )),
        }
    }
}

impl fmt::Display for StlLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlLayout::Flat => f.write_str("flat"),
            StlLayout::PerExamination => f.write_str("per_examination"),
        }
    }
}

/// Persists extracted entries into the media store. Blocking; run off the async runtime.
#[derive(Debug, Clone)]
pub struct ExtractionWriter {
    media: MediaStore,
    subdir: String,
    layout: StlLayout,
}

impl ExtractionWriter {
    pub fn new(media: MediaStore, subdir: impl Into<String>, layout: StlLayout) -> Self {
        Self {
            media,
            subdir: subdir.into(),
            layout,
        }
    }

    pub fn layout(&self) -> StlLayout {
        self.layout
    }

    /// Media-relative destination of `name` for one examination.
    pub fn relative_path(&self, examination_id: i64, name: &str) -> String {
        match self.layout {
            StlLayout::Flat => format!("{}/{}", self.subdir, name),
            StlLayout::PerExamination => format!("{}/{}/{}", self.subdir, examination_id, name),
        }
    }

    /// Write (or overwrite) one entry. Returns its media-relative path.
    pub fn write(&self, examination_id: i64, name: &str, bytes: &[u8]) -> Result<String, StlError> {
        if !sanitize_filename::is_sanitized(name) {
            return Err(StlError::StorageWriteFailed(format!(
                "Refusing to write unsafe file name '{name}'"
            )));
        }

        let relative = self.relative_path(examination_id, name);
        let path = self.media.absolute_path(&relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StlError::StorageWriteFailed(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, bytes).map_err(|e| {
            StlError::StorageWriteFailed(format!("Failed to write {}: {e}", path.display()))
        })?;

        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(relative)
    }

    pub fn download_link(&self, origin: &RequestOrigin, relative: &str) -> String {
        self.media.url_for(origin, relative)
    }
}
