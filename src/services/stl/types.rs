use serde::Serialize;
use thiserror::Error;

use crate::services::media::RequestOrigin;

/// Failure modes of an extraction request. Every variant maps to a stable `code()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StlError {
    #[error("Examination not found.")]
    RecordNotFound,
    #[error("Examination has no archive attached.")]
    MissingArchive,
    #[error("Failed to download the file.")]
    UpstreamFetchFailed { status: u16 },
    #[error("Failed to download the file: {0}")]
    Network(String),
    #[error("Invalid or corrupt ZIP: {0}")]
    CorruptArchive(String),
    #[error("Archive exceeds the allowed size: {0}")]
    ArchiveTooLarge(String),
    #[error("No STL files were found in ZIP.")]
    NoMatchingEntries,
    #[error("Failed to save STL files: {0}")]
    StorageWriteFailed(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl StlError {
    pub fn code(&self) -> &'static str {
        match self {
            StlError::RecordNotFound => "record_not_found",
            StlError::MissingArchive => "missing_archive",
            StlError::UpstreamFetchFailed { status } if (400..500).contains(status) => {
                "upstream_rejected"
            }
            StlError::UpstreamFetchFailed { .. } => "upstream_unavailable",
            StlError::Network(_) => "network",
            StlError::CorruptArchive(_) => "corrupt_archive",
            StlError::ArchiveTooLarge(_) => "archive_too_large",
            StlError::NoMatchingEntries => "no_matching_entries",
            StlError::StorageWriteFailed(_) => "storage_write_failed",
            StlError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<sqlx::Error> for StlError {
    fn from(error: sqlx::Error) -> Self {
        StlError::Unexpected(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFileDescriptor {
    pub filename: String,
    pub download_link: String,
}

/// An entry that was selected but could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFileDescriptor {
    pub filename: String,
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StlExtraction {
    pub files: Vec<ExtractedFileDescriptor>,
    pub failed: Vec<FailedFileDescriptor>,
}

#[derive(Debug, Clone)]
pub struct StlRequest {
    pub examination_id: i64,
    /// Empty means "every allow-listed mesh present".
    pub requested: Vec<String>,
    pub origin: RequestOrigin,
}
