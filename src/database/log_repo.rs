use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{like_pattern, now_timestamp, push_search};

/// Device log row. JSON keys keep the device client's camelCase names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LogRow {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(rename = "hardwareCode")]
    pub hardware_code: String,
    #[serde(rename = "softwareCode")]
    pub software_code: String,
    #[serde(rename = "logTxt")]
    pub log_txt: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewLog<'a> {
    pub user_id: i64,
    pub hardware_code: &'a str,
    pub software_code: &'a str,
    pub log_txt: &'a str,
}

const LOG_COLUMNS: &str = "id, user_id, hardware_code, software_code, log_txt, created_at";

pub async fn insert_log(pool: &SqlitePool, log: &NewLog<'_>) -> Result<LogRow, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO logs (user_id, hardware_code, software_code, log_txt, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(log.user_id)
    .bind(log.hardware_code)
    .bind(log.software_code)
    .bind(log.log_txt)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_log(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_log(pool: &SqlitePool, log_id: i64) -> Result<Option<LogRow>, sqlx::Error> {
    sqlx::query_as::<_, LogRow>(&format!("SELECT {LOG_COLUMNS} FROM logs WHERE id = ?"))
        .bind(log_id)
        .fetch_optional(pool)
        .await
}

pub async fn search_logs(pool: &SqlitePool, query: Option<&str>) -> Result<Vec<LogRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {LOG_COLUMNS} FROM logs"));

    if let Some(pattern) = like_pattern(query) {
        push_search(&mut qb, &["hardware_code", "software_code", "log_txt"], &pattern);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    qb.build_query_as::<LogRow>().fetch_all(pool).await
}
