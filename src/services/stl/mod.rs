//! Examination STL extraction: fetch the uploaded scan archive, pick the
//! allow-listed meshes out of it and publish them in the media store.
//!
//! Stages: fetch (async, `ArchiveSource`) -> open (`ArchiveHandle`) ->
//! select (`select_entries`) -> write (`ExtractionWriter`). Open, select and
//! write run on a blocking worker.

mod fetch;
mod known_files;
mod reader;
mod selector;
mod types;
mod writer;

pub use fetch::{ArchiveSource, HttpArchiveSource};
pub use known_files::{MeshAllowList, KNOWN_MESH_FILENAMES};
pub use reader::{validate_archive, ArchiveHandle, ArchiveLimits};
pub use selector::select_entries;
pub use types::{
    ExtractedFileDescriptor, FailedFileDescriptor, StlError, StlExtraction, StlRequest,
};
pub use writer::{ExtractionWriter, StlLayout};

use log::{info, warn};
use sqlx::SqlitePool;

use crate::database::examination_repo;
use crate::services::config::StlConfig;
use crate::services::media::{MediaStore, RequestOrigin};

pub struct StlExtractor<S: ArchiveSource> {
    source: S,
    media: MediaStore,
    allow_list: MeshAllowList,
    writer: ExtractionWriter,
    limits: ArchiveLimits,
    blob_base_url: Option<String>,
}

impl<S: ArchiveSource> StlExtractor<S> {
    pub fn new(
        source: S,
        media: MediaStore,
        config: &StlConfig,
        blob_base_url: Option<String>,
    ) -> Self {
        Self {
            source,
            writer: ExtractionWriter::new(media.clone(), config.subdir.clone(), config.layout),
            media,
            allow_list: config.allow_list.clone(),
            limits: config.limits,
            blob_base_url,
        }
    }

    pub fn allow_list(&self) -> &MeshAllowList {
        &self.allow_list
    }

    /// Absolute URL the archive at `download` is fetched from.
    pub fn archive_url(&self, download: &str, origin: &RequestOrigin) -> String {
        match &self.blob_base_url {
            Some(base) => format!("{}{}", base, self.media.public_path(download)),
            None => self.media.url_for(origin, download),
        }
    }

    /// Run the whole pipeline for one examination.
    ///
    /// The record is resolved before anything is fetched. Selected entries
    /// are written best-effort: per-file failures land in `failed`, and the
    /// call only fails outright when nothing could be written.
    pub async fn extract(
        &self,
        pool: &SqlitePool,
        request: &StlRequest,
    ) -> Result<StlExtraction, StlError> {
        let examination = examination_repo::get_examination(pool, request.examination_id)
            .await?
            .ok_or(StlError::RecordNotFound)?;

        let download = examination.download.trim();
        if download.is_empty() {
            return Err(StlError::MissingArchive);
        }

        let url = self.archive_url(download, &request.origin);
        let bytes = self.source.fetch(&url).await?;

        let limits = self.limits;
        let allow_list = self.allow_list.clone();
        let writer = self.writer.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || {
            extract_entries(bytes, limits, &allow_list, &writer, &request)
        })
        .await
        .map_err(|e| StlError::Unexpected(format!("Extraction task failed: {e}")))?
    }
}

/// Blocking part of the pipeline: open, select, read and write.
pub fn extract_entries(
    bytes: Vec<u8>,
    limits: ArchiveLimits,
    allow_list: &MeshAllowList,
    writer: &ExtractionWriter,
    request: &StlRequest,
) -> Result<StlExtraction, StlError> {
    let mut archive = ArchiveHandle::open(bytes, limits)?;

    let selected = select_entries(allow_list, archive.entry_names(), &request.requested);
    if selected.is_empty() {
        return Err(StlError::NoMatchingEntries);
    }

    let mut result = StlExtraction::default();
    let mut errors = Vec::new();
    for name in selected {
        let written = archive
            .read_entry(&name)
            .and_then(|data| writer.write(request.examination_id, &name, &data));

        match written {
            Ok(relative) => result.files.push(ExtractedFileDescriptor {
                download_link: writer.download_link(&request.origin, &relative),
                filename: name,
            }),
            Err(e) => {
                warn!("Skipping {name} for examination {}: {e}", request.examination_id);
                result.failed.push(FailedFileDescriptor {
                    filename: name,
                    code: e.code(),
                    error: e.to_string(),
                });
                errors.push(e);
            }
        }
    }

    if result.files.is_empty() {
        return Err(nothing_written(errors));
    }

    info!(
        "Extracted {} STL file(s) for examination {} ({} failed)",
        result.files.len(),
        request.examination_id,
        result.failed.len()
    );
    Ok(result)
}

/// Error for a run where every selected entry failed. A shared cause is
/// reported as itself; mixed causes collapse into `StorageWriteFailed`.
fn nothing_written(errors: Vec<StlError>) -> StlError {
    let count = errors.len();
    let mixed = errors.windows(2).any(|pair| pair[0].code() != pair[1].code());

    match errors.into_iter().next() {
        Some(only_cause) if !mixed => only_cause,
        first => StlError::StorageWriteFailed(format!(
            "none of {count} selected files could be saved ({})",
            first.map(|e| e.to_string()).unwrap_or_default()
        )),
    }
}

#[cfg(test)]
#[path = "tests/stl_tests.rs"]
mod tests;
