use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{required_text, user_routes::check_owner, SearchQuery};
use crate::database::bug_repo::{self, BugRow, NewBug};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

const CODE_MAX_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct BugPayload {
    pub user_id: Option<i64>,
    #[serde(rename = "hardwareCode")]
    pub hardware_code: Option<String>,
    #[serde(rename = "softwareCode")]
    pub software_code: Option<String>,
    #[serde(rename = "bugTxt")]
    pub bug_txt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<i64>,
}

pub async fn create_bug(
    State(state): State<SharedState>,
    Json(payload): Json<BugPayload>,
) -> ApiResult<(StatusCode, Json<BugRow>)> {
    let mut errors = FieldErrors::new();
    let hardware_code = required_text(
        &mut errors,
        "hardwareCode",
        payload.hardware_code.as_deref(),
        Some(CODE_MAX_LEN),
    );
    let software_code = required_text(
        &mut errors,
        "softwareCode",
        payload.software_code.as_deref(),
        Some(CODE_MAX_LEN),
    );
    let bug_txt = required_text(&mut errors, "bugTxt", payload.bug_txt.as_deref(), None);
    let user_id = check_owner(&state.pool, &mut errors, "user_id", payload.user_id).await?;
    errors.into_result()?;

    let Some(user_id) = user_id else {
        return Err(ApiError::field("user_id", "This field is required."));
    };

    let bug = bug_repo::insert_bug(
        &state.pool,
        &NewBug {
            user_id,
            hardware_code: &hardware_code,
            software_code: &software_code,
            bug_txt: &bug_txt,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(bug)))
}

pub async fn user_bugs(
    State(state): State<SharedState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<Vec<BugRow>>> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::field("user_id", "This field is required."))?;
    Ok(Json(bug_repo::list_user_bugs(&state.pool, user_id).await?))
}

pub async fn all_bugs(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<BugRow>>> {
    Ok(Json(
        bug_repo::search_bugs(&state.pool, query.search.as_deref()).await?,
    ))
}

pub async fn get_bug(
    State(state): State<SharedState>,
    Path(bug_id): Path<i64>,
) -> ApiResult<Json<BugRow>> {
    bug_repo::get_bug(&state.pool, bug_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Bug not found.".into()))
}
