use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{required_text, user_routes::check_owner, SearchQuery};
use crate::database::ticket_repo::{self, TicketRow};
use crate::state::SharedState;
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

#[derive(Debug, Default, Deserialize)]
pub struct TicketPayload {
    pub customer_id: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub active: Option<bool>,
}

pub async fn create_ticket(
    State(state): State<SharedState>,
    Json(payload): Json<TicketPayload>,
) -> ApiResult<(StatusCode, Json<TicketRow>)> {
    let mut errors = FieldErrors::new();
    let title = required_text(&mut errors, "title", payload.title.as_deref(), Some(255));
    let body = required_text(&mut errors, "body", payload.body.as_deref(), None);
    let customer_id =
        check_owner(&state.pool, &mut errors, "customer_id", payload.customer_id).await?;
    errors.into_result()?;

    let Some(customer_id) = customer_id else {
        return Err(ApiError::field("customer_id", "This field is required."));
    };

    let ticket = ticket_repo::insert_ticket(
        &state.pool,
        customer_id,
        &title,
        &body,
        payload.active.unwrap_or(true),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn all_tickets(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<TicketRow>>> {
    Ok(Json(
        ticket_repo::search_tickets(&state.pool, query.search.as_deref()).await?,
    ))
}

pub async fn get_ticket(
    State(state): State<SharedState>,
    Path(ticket_id): Path<i64>,
) -> ApiResult<Json<TicketRow>> {
    ticket_repo::get_ticket(&state.pool, ticket_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Ticket not found.".into()))
}
