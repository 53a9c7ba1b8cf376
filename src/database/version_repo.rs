use sqlx::SqlitePool;

use super::now_timestamp;

/// Distributed app build. `file` / `additional_file` are media-relative paths.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppVersionRow {
    pub id: i64,
    pub version_number: String,
    pub file: String,
    pub additional_file: Option<String>,
    pub created_at: String,
}

const VERSION_COLUMNS: &str = "id, version_number, file, additional_file, created_at";

pub async fn insert_version(
    pool: &SqlitePool,
    version_number: &str,
    file: &str,
    additional_file: Option<&str>,
) -> Result<AppVersionRow, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO app_versions (version_number, file, additional_file, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(version_number)
    .bind(file)
    .bind(additional_file)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    sqlx::query_as::<_, AppVersionRow>(&format!(
        "SELECT {VERSION_COLUMNS} FROM app_versions WHERE id = ?"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Most recently uploaded version, if any.
pub async fn get_latest_version(pool: &SqlitePool) -> Result<Option<AppVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, AppVersionRow>(&format!(
        "SELECT {VERSION_COLUMNS} FROM app_versions ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub async fn list_versions(pool: &SqlitePool) -> Result<Vec<AppVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, AppVersionRow>(&format!(
        "SELECT {VERSION_COLUMNS} FROM app_versions ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}
