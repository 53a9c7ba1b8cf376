use axum::Json;

use super::API_ROUTES;

pub async fn list_routes() -> Json<&'static [&'static str]> {
    Json(API_ROUTES)
}
