//! Publicly served file area: uploaded archives, app builds and extracted meshes.
//!
//! Paths handed around the app are media-relative (`examinations/x.zip`);
//! `MediaStore` turns them into filesystem paths and public URLs.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Scheme and host a request arrived on, used to build absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    /// `url_prefix` is expected in normalized `/prefix/` form.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Filesystem path of a media-relative path. `.`/`..` segments are dropped.
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        segments(relative).fold(self.root.clone(), |path, seg| path.join(seg))
    }

    /// URL path (prefix included) of a media-relative path, percent-encoded per segment.
    pub fn public_path(&self, relative: &str) -> String {
        let encoded: Vec<String> = segments(relative)
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect();
        format!("{}{}", self.url_prefix, encoded.join("/"))
    }

    pub fn url_for(&self, origin: &RequestOrigin, relative: &str) -> String {
        format!("{}{}", origin.base_url(), self.public_path(relative))
    }

    /// Store an uploaded file under `area/` with a unique, sanitized name.
    /// Returns the media-relative path.
    pub async fn save_upload(
        &self,
        area: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> io::Result<String> {
        let cleaned = sanitize_filename::sanitize(original_name).replace(' ', "_");
        let cleaned = if cleaned.is_empty() {
            "upload".to_string()
        } else {
            cleaned
        };
        let relative = format!(
            "{}/{}_{}",
            area.trim_matches('/'),
            uuid::Uuid::new_v4().simple(),
            cleaned
        );

        let path = self.absolute_path(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        info!("Stored upload {} ({} bytes)", relative, bytes.len());
        Ok(relative)
    }

    /// Delete a stored file. Missing files are not an error.
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.absolute_path(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Media file already gone: {relative}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn segments(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .split(['/', '\\'])
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
}
