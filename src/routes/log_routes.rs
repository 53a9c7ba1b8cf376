use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{required_text, user_routes::check_owner, SearchQuery};
use crate::database::log_repo::{self, LogRow, NewLog};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

#[derive(Debug, Default, Deserialize)]
pub struct LogPayload {
    pub user_id: Option<i64>,
    #[serde(rename = "hardwareCode")]
    pub hardware_code: Option<String>,
    #[serde(rename = "softwareCode")]
    pub software_code: Option<String>,
    #[serde(rename = "logTxt")]
    pub log_txt: Option<String>,
}

pub async fn create_log(
    State(state): State<SharedState>,
    Json(payload): Json<LogPayload>,
) -> ApiResult<(StatusCode, Json<LogRow>)> {
    let mut errors = FieldErrors::new();
    let hardware_code = required_text(
        &mut errors,
        "hardwareCode",
        payload.hardware_code.as_deref(),
        Some(100),
    );
    let software_code = required_text(
        &mut errors,
        "softwareCode",
        payload.software_code.as_deref(),
        Some(100),
    );
    let log_txt = required_text(&mut errors, "logTxt", payload.log_txt.as_deref(), None);
    let user_id = check_owner(&state.pool, &mut errors, "user_id", payload.user_id).await?;
    errors.into_result()?;

    let Some(user_id) = user_id else {
        return Err(ApiError::field("user_id", "This field is required."));
    };

    let row = log_repo::insert_log(
        &state.pool,
        &NewLog {
            user_id,
            hardware_code: &hardware_code,
            software_code: &software_code,
            log_txt: &log_txt,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn all_logs(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<LogRow>>> {
    Ok(Json(
        log_repo::search_logs(&state.pool, query.search.as_deref()).await?,
    ))
}

pub async fn get_log(
    State(state): State<SharedState>,
    Path(log_id): Path<i64>,
) -> ApiResult<Json<LogRow>> {
    log_repo::get_log(&state.pool, log_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Log not found.".into()))
}
