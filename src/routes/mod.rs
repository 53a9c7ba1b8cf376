//! HTTP surface. Paths live under `/api/` and keep their trailing slash.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::state::SharedState;
use crate::types::errors::FieldErrors;

mod app_routes;
mod bug_routes;
mod examination_routes;
mod form;
mod log_routes;
mod origin;
mod ticket_routes;
mod user_routes;
mod version_routes;

pub use origin::parse_filenames;

/// Paths listed by `GET /api/`.
pub const API_ROUTES: &[&str] = &[
    "/api/register/",
    "/api/users/",
    "/api/logs/",
    "/api/bugs/",
    "/api/upload-version/",
    "/api/latest-version/",
    "/api/examinations/create/",
    "/api/examinations/",
    "/api/tickets/",
];

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/api/", get(app_routes::list_routes))
        .route("/api/register/", post(user_routes::register))
        .route("/api/users/", get(user_routes::list_users))
        .route(
            "/api/users/{id}/",
            get(user_routes::get_user)
                .put(user_routes::replace_user)
                .delete(user_routes::delete_user),
        )
        .route("/api/users/{id}/update/", patch(user_routes::update_user))
        .route("/api/users/{id}/delete/", delete(user_routes::delete_user))
        .route("/api/logs/", post(log_routes::create_log))
        .route("/api/logs/all/", get(log_routes::all_logs))
        .route("/api/logs/{id}/", get(log_routes::get_log))
        .route("/api/bugs/", post(bug_routes::create_bug))
        .route("/api/bugs/my/", get(bug_routes::user_bugs))
        .route("/api/bugs/all/", get(bug_routes::all_bugs))
        .route("/api/bugs/{id}/", get(bug_routes::get_bug))
        .route("/api/upload-version/", post(version_routes::upload_version))
        .route("/api/latest-version/", get(version_routes::latest_version))
        .route("/api/versions/all/", get(version_routes::all_versions))
        .route("/api/examinations/", get(examination_routes::list_examinations))
        .route(
            "/api/examinations/create/",
            post(examination_routes::create_examination),
        )
        .route(
            "/api/examinations/{id}/",
            get(examination_routes::get_examination),
        )
        .route(
            "/api/examinations/{id}/fetch-stl/",
            get(examination_routes::fetch_stl),
        )
        .route("/api/tickets/", get(ticket_routes::all_tickets))
        .route("/api/tickets/create/", post(ticket_routes::create_ticket))
        .route("/api/tickets/{id}/", get(ticket_routes::get_ticket));

    let media_prefix = state.config.media_url.trim_end_matches('/').to_string();
    let media = ServeDir::new(state.config.media_root.clone());
    let app = if media_prefix.is_empty() {
        api.fallback_service(media)
    } else {
        api.nest_service(&media_prefix, media)
    };

    app.layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Trimmed text for a required field; records "required" / length errors.
pub(crate) fn required_text(
    errors: &mut FieldErrors,
    key: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> String {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(key, "This field is required.");
    } else {
        check_len(errors, key, value, max_len);
    }
    value.to_string()
}

/// Trimmed text for an optional field, empty when absent.
pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    key: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> String {
    let value = value.map(str::trim).unwrap_or_default();
    check_len(errors, key, value, max_len);
    value.to_string()
}

fn check_len(errors: &mut FieldErrors, key: &str, value: &str, max_len: Option<usize>) {
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.add(
                key,
                format!("Ensure this field has no more than {max} characters."),
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
