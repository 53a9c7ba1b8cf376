use axum::{
    extract::{Multipart, Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::{form::MultipartForm, optional_text, parse_filenames, user_routes::check_owner};
use crate::database::examination_repo::{self, ExaminationRow, NewExamination};
use crate::services::media::{MediaStore, RequestOrigin};
use crate::services::stl::{
    validate_archive, ExtractedFileDescriptor, FailedFileDescriptor, StlError, StlRequest,
};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

const UPLOAD_AREA: &str = "examinations";
const ZIP_ONLY: &str = "Only ZIP files are accepted for upload.";

#[derive(Debug, Serialize)]
pub struct ExaminationResponse {
    pub id: i64,
    pub customer_username: String,
    pub dataset: String,
    pub design_title: String,
    pub last_uid: String,
    pub high_heel: bool,
    pub has_shoe: bool,
    pub single_foot: bool,
    /// Absolute URL of the uploaded archive.
    pub download: String,
    pub created_at: String,
}

impl ExaminationResponse {
    fn from_row(row: ExaminationRow, media: &MediaStore, origin: &RequestOrigin) -> Self {
        Self {
            download: media.url_for(origin, &row.download),
            id: row.id,
            customer_username: row.customer_username,
            dataset: row.dataset,
            design_title: row.design_title,
            last_uid: row.last_uid,
            high_heel: row.high_heel,
            has_shoe: row.has_shoe,
            single_foot: row.single_foot,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StlResponse {
    pub message: &'static str,
    pub files: Vec<ExtractedFileDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedFileDescriptor>,
}

impl IntoResponse for StlError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, body) = match &self {
            StlError::RecordNotFound | StlError::MissingArchive | StlError::NoMatchingEntries => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string(), "code": code }),
            ),
            StlError::UpstreamFetchFailed { status } => {
                let echoed = StatusCode::from_u16(*status)
                    .ok()
                    .filter(StatusCode::is_client_error)
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    echoed,
                    json!({ "error": self.to_string(), "status_code": status, "code": code }),
                )
            }
            StlError::Network(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": self.to_string(), "code": code }),
            ),
            StlError::CorruptArchive(_)
            | StlError::ArchiveTooLarge(_)
            | StlError::StorageWriteFailed(_)
            | StlError::Unexpected(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string(), "code": code }),
            ),
        };

        if status.is_server_error() {
            log::error!("STL extraction failed: {self}");
        } else {
            log::warn!("STL extraction rejected: {self}");
        }
        (status, Json(body)).into_response()
    }
}

pub async fn fetch_stl(
    State(state): State<SharedState>,
    Path(examination_id): Path<i64>,
    origin: RequestOrigin,
    RawQuery(query): RawQuery,
) -> Result<Json<StlResponse>, StlError> {
    let request = StlRequest {
        examination_id,
        requested: parse_filenames(query.as_deref()),
        origin,
    };
    let extraction = state.stl.extract(&state.pool, &request).await?;

    Ok(Json(StlResponse {
        message: "STL files saved successfully.",
        files: extraction.files,
        failed: extraction.failed,
    }))
}

pub async fn create_examination(
    State(state): State<SharedState>,
    origin: RequestOrigin,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ExaminationResponse>)> {
    let mut form = MultipartForm::collect(multipart).await?;

    let archive = form
        .take_file("download")
        .filter(|file| file.file_name.to_ascii_lowercase().ends_with(".zip"))
        .ok_or_else(|| ApiError::BadRequest(ZIP_ONLY.into()))?;
    validate_archive(&archive.bytes).map_err(|e| {
        log::warn!("Rejected examination upload {}: {e}", archive.file_name);
        ApiError::BadRequest(ZIP_ONLY.into())
    })?;

    let mut errors = FieldErrors::new();
    let dataset = optional_text(&mut errors, "dataset", form.text("dataset"), Some(255));
    let design_title = optional_text(&mut errors, "design_title", form.text("design_title"), Some(255));
    let last_uid = optional_text(&mut errors, "last_uid", form.text("last_uid"), Some(255));
    let high_heel = form.flag(&mut errors, "high_heel");
    let has_shoe = form.flag(&mut errors, "has_shoe");
    let single_foot = form.flag(&mut errors, "single_foot");
    let customer_id = form.id(&mut errors, "customer_id");
    let customer_id = match customer_id {
        Some(id) => check_owner(&state.pool, &mut errors, "customer_id", Some(id)).await?,
        None => None,
    };
    errors.into_result()?;

    let Some(customer_id) = customer_id else {
        return Err(ApiError::field("customer_id", "This field is required."));
    };

    let stored = state
        .media
        .save_upload(UPLOAD_AREA, &archive.file_name, &archive.bytes)
        .await?;

    let inserted = examination_repo::insert_examination(
        &state.pool,
        &NewExamination {
            customer_id,
            dataset: &dataset,
            design_title: &design_title,
            last_uid: &last_uid,
            high_heel,
            has_shoe,
            single_foot,
            download: &stored,
        },
    )
    .await;

    let row = match inserted {
        Ok(row) => row,
        Err(e) => {
            if let Err(cleanup) = state.media.remove(&stored).await {
                log::warn!("Failed to remove orphaned upload {stored}: {cleanup}");
            }
            return Err(e.into());
        }
    };
    log::info!("Examination created successfully: {}", row.design_title);

    Ok((
        StatusCode::CREATED,
        Json(ExaminationResponse::from_row(row, &state.media, &origin)),
    ))
}

pub async fn list_examinations(
    State(state): State<SharedState>,
    origin: RequestOrigin,
) -> ApiResult<Json<Vec<ExaminationResponse>>> {
    let rows = examination_repo::list_examinations(&state.pool).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| ExaminationResponse::from_row(row, &state.media, &origin))
            .collect(),
    ))
}

pub async fn get_examination(
    State(state): State<SharedState>,
    Path(examination_id): Path<i64>,
    origin: RequestOrigin,
) -> ApiResult<Json<ExaminationResponse>> {
    examination_repo::get_examination(&state.pool, examination_id)
        .await?
        .map(|row| Json(ExaminationResponse::from_row(row, &state.media, &origin)))
        .ok_or_else(|| ApiError::NotFound("Examination not found.".into()))
}
