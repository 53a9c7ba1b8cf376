use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{like_pattern, now_timestamp, push_search};

/// Bug report row. JSON keys keep the device client's camelCase names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BugRow {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(rename = "hardwareCode")]
    pub hardware_code: String,
    #[serde(rename = "softwareCode")]
    pub software_code: String,
    #[serde(rename = "bugTxt")]
    pub bug_txt: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewBug<'a> {
    pub user_id: i64,
    pub hardware_code: &'a str,
    pub software_code: &'a str,
    pub bug_txt: &'a str,
}

const BUG_COLUMNS: &str = "id, user_id, hardware_code, software_code, bug_txt, created_at";

pub async fn insert_bug(pool: &SqlitePool, bug: &NewBug<'_>) -> Result<BugRow, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO bugs (user_id, hardware_code, software_code, bug_txt, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(bug.user_id)
    .bind(bug.hardware_code)
    .bind(bug.software_code)
    .bind(bug.bug_txt)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_bug(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_bug(pool: &SqlitePool, bug_id: i64) -> Result<Option<BugRow>, sqlx::Error> {
    sqlx::query_as::<_, BugRow>(&format!("SELECT {BUG_COLUMNS} FROM bugs WHERE id = ?"))
        .bind(bug_id)
        .fetch_optional(pool)
        .await
}

/// All bugs filed by one user, newest first.
pub async fn list_user_bugs(pool: &SqlitePool, user_id: i64) -> Result<Vec<BugRow>, sqlx::Error> {
    sqlx::query_as::<_, BugRow>(&format!(
        "SELECT {BUG_COLUMNS} FROM bugs WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// All bugs, optionally filtered by a substring of hardware code, software code or text.
pub async fn search_bugs(pool: &SqlitePool, query: Option<&str>) -> Result<Vec<BugRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {BUG_COLUMNS} FROM bugs"));

    if let Some(pattern) = like_pattern(query) {
        push_search(&mut qb, &["hardware_code", "software_code", "bug_txt"], &pattern);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    qb.build_query_as::<BugRow>().fetch_all(pool).await
}

#[cfg(test)]
#[path = "tests/bug_repo_test.rs"]
mod tests;
