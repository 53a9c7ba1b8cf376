use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{like_pattern, now_timestamp, push_search};

/// Support ticket joined with the owning customer's username.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TicketRow {
    pub id: i64,
    #[serde(skip_serializing)]
    pub customer_id: i64,
    pub customer_username: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub active: bool,
}

const TICKET_SELECT: &str = "SELECT t.id, t.customer_id, u.username AS customer_username, t.title, t.body, t.created_at, t.active
     FROM tickets t JOIN users u ON u.id = t.customer_id";

pub async fn insert_ticket(
    pool: &SqlitePool,
    customer_id: i64,
    title: &str,
    body: &str,
    active: bool,
) -> Result<TicketRow, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO tickets (customer_id, title, body, active, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(customer_id)
    .bind(title)
    .bind(body)
    .bind(active)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_ticket(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_ticket(pool: &SqlitePool, ticket_id: i64) -> Result<Option<TicketRow>, sqlx::Error> {
    sqlx::query_as::<_, TicketRow>(&format!("{TICKET_SELECT} WHERE t.id = ?"))
        .bind(ticket_id)
        .fetch_optional(pool)
        .await
}

/// All tickets, optionally filtered by a substring of title or body.
pub async fn search_tickets(
    pool: &SqlitePool,
    query: Option<&str>,
) -> Result<Vec<TicketRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TICKET_SELECT);

    if let Some(pattern) = like_pattern(query) {
        push_search(&mut qb, &["t.title", "t.body"], &pattern);
    }
    qb.push(" ORDER BY t.created_at DESC, t.id DESC");

    qb.build_query_as::<TicketRow>().fetch_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_db, seed_user};

    #[tokio::test]
    async fn test_ticket_round_trip_with_username() {
        let pool = init_test_db().await.pool;
        let customer = seed_user(&pool, "patient").await;

        let ticket = insert_ticket(&pool, customer, "Insole too stiff", "Left roof rubs", true)
            .await
            .unwrap();
        assert_eq!(ticket.customer_username, "patient");
        assert!(ticket.active);

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["customer_username"], "patient");
        assert!(json.get("customer_id").is_none());
    }

    #[tokio::test]
    async fn test_ticket_search_title_and_body() {
        let pool = init_test_db().await.pool;
        let customer = seed_user(&pool, "patient").await;
        insert_ticket(&pool, customer, "Shipping", "Where is my order?", true)
            .await
            .unwrap();
        insert_ticket(&pool, customer, "Refund", "Order arrived damaged", false)
            .await
            .unwrap();

        assert_eq!(search_tickets(&pool, Some("order")).await.unwrap().len(), 2);
        assert_eq!(search_tickets(&pool, Some("refund")).await.unwrap().len(), 1);
        assert_eq!(search_tickets(&pool, None).await.unwrap()[0].title, "Refund");
    }
}
