use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{form::MultipartForm, required_text};
use crate::database::version_repo::{self, AppVersionRow};
use crate::services::media::{MediaStore, RequestOrigin};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

const UPLOAD_AREA: &str = "app_versions";

/// App version with file paths expanded to absolute media URLs.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: i64,
    pub version_number: String,
    pub file: String,
    pub additional_file: Option<String>,
    pub created_at: String,
}

impl VersionResponse {
    fn from_row(row: AppVersionRow, media: &MediaStore, origin: &RequestOrigin) -> Self {
        Self {
            id: row.id,
            version_number: row.version_number,
            file: media.url_for(origin, &row.file),
            additional_file: row
                .additional_file
                .as_deref()
                .map(|path| media.url_for(origin, path)),
            created_at: row.created_at,
        }
    }
}

pub async fn upload_version(
    State(state): State<SharedState>,
    origin: RequestOrigin,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<VersionResponse>)> {
    let mut form = MultipartForm::collect(multipart).await?;
    let mut errors = FieldErrors::new();

    let version_number =
        required_text(&mut errors, "version_number", form.text("version_number"), Some(50));
    let file = form.take_file("file");
    if file.is_none() {
        errors.add("file", "No file was submitted.");
    }
    errors.into_result()?;

    let Some(file) = file else {
        return Err(ApiError::field("file", "No file was submitted."));
    };

    let stored = state
        .media
        .save_upload(UPLOAD_AREA, &file.file_name, &file.bytes)
        .await?;
    let additional = match form.take_file("additional_file") {
        Some(extra) => Some(
            state
                .media
                .save_upload(UPLOAD_AREA, &extra.file_name, &extra.bytes)
                .await?,
        ),
        None => None,
    };

    let row = version_repo::insert_version(
        &state.pool,
        &version_number,
        &stored,
        additional.as_deref(),
    )
    .await?;
    log::info!("Uploaded app version {}", row.version_number);

    Ok((
        StatusCode::CREATED,
        Json(VersionResponse::from_row(row, &state.media, &origin)),
    ))
}

pub async fn latest_version(
    State(state): State<SharedState>,
    origin: RequestOrigin,
) -> ApiResult<Json<VersionResponse>> {
    version_repo::get_latest_version(&state.pool)
        .await?
        .map(|row| Json(VersionResponse::from_row(row, &state.media, &origin)))
        .ok_or_else(|| ApiError::NotFound("No versions available.".into()))
}

pub async fn all_versions(
    State(state): State<SharedState>,
    origin: RequestOrigin,
) -> ApiResult<Json<Vec<VersionResponse>>> {
    let rows = version_repo::list_versions(&state.pool).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| VersionResponse::from_row(row, &state.media, &origin))
            .collect(),
    ))
}
