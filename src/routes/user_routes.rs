use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use super::SearchQuery;
use crate::database::user_repo::{self, UserPatch, UserRow};
use crate::services::accounts::{self, RegisterRequest};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

/// Echo of the accepted registration, passwords left out.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub username: String,
    pub serial_number: Option<String>,
    pub phone_number: Option<String>,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found.".into())
}

/// Record a field error when `user_id` does not name an existing user.
pub(super) async fn check_owner(
    pool: &SqlitePool,
    errors: &mut FieldErrors,
    key: &str,
    user_id: Option<i64>,
) -> ApiResult<Option<i64>> {
    match user_id {
        None => {
            errors.add(key, "This field is required.");
            Ok(None)
        }
        Some(id) if !user_repo::user_exists(pool, id).await? => {
            errors.add(key, format!("Invalid pk \"{id}\" - object does not exist."));
            Ok(None)
        }
        Some(id) => Ok(Some(id)),
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let user = accounts::register_user(&state.pool, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            email: user.email,
            username: user.username,
            serial_number: user.serial_number,
            phone_number: user.phone_number,
        }),
    ))
}

pub async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserRow>>> {
    let users = user_repo::search_users(&state.pool, query.search.as_deref()).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserRow>> {
    user_repo::get_user(&state.pool, user_id)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

async fn apply_update(
    state: &SharedState,
    user_id: i64,
    patch: &UserPatch,
    full: bool,
) -> ApiResult<Json<UserRow>> {
    if !user_repo::user_exists(&state.pool, user_id).await? {
        return Err(user_not_found());
    }
    let cleaned = accounts::validate_user_update(&state.pool, user_id, patch, full).await?;
    user_repo::update_user(&state.pool, user_id, &cleaned)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

pub async fn replace_user(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<UserRow>> {
    apply_update(&state, user_id, &patch, true).await
}

pub async fn update_user(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<UserRow>> {
    apply_update(&state, user_id, &patch, false).await
}

pub async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    if user_repo::delete_user(&state.pool, user_id).await? {
        log::info!("Deleted user {user_id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(user_not_found())
    }
}
