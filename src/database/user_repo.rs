use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{like_pattern, now_timestamp, push_search};

/// User row stored in the `users` table.
/// Only the public account fields are serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub serial_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub is_superuser: bool,
    #[serde(skip_serializing)]
    pub date_joined: String,
}

/// Profile row, created together with its user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProfileRow {
    pub user_id: i64,
    pub full_name: String,
    pub bio: String,
    pub image: String,
    pub verified: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub serial_number: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub serial_number: Option<String>,
}

/// Columns carrying a UNIQUE constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniqueField {
    Username,
    Email,
    SerialNumber,
    PhoneNumber,
}

impl UniqueField {
    fn column(self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::SerialNumber => "serial_number",
            UniqueField::PhoneNumber => "phone_number",
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, phone_number, serial_number, password_hash, is_superuser, date_joined";

// ── Users CRUD ──────────────────────────────────────────────

/// Insert a user and its default profile in one transaction.
pub async fn insert_user(pool: &SqlitePool, user: &NewUser<'_>) -> Result<UserRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (username, email, serial_number, phone_number, password_hash, is_superuser, date_joined)
         VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.serial_number)
    .bind(user.phone_number)
    .bind(user.password_hash)
    .bind(now_timestamp())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn user_exists(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// List users, optionally filtered by a substring of username, email or serial number.
pub async fn search_users(
    pool: &SqlitePool,
    query: Option<&str>,
) -> Result<Vec<UserRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));

    if let Some(pattern) = like_pattern(query) {
        push_search(&mut qb, &["username", "email", "serial_number"], &pattern);
    }
    qb.push(" ORDER BY id");

    qb.build_query_as::<UserRow>().fetch_all(pool).await
}

/// Whether `value` is already taken in a unique column, ignoring `exclude_id`.
pub async fn is_taken(
    pool: &SqlitePool,
    field: UniqueField,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT 1 FROM users WHERE {} = ? AND id != ?",
        field.column()
    );
    let found: Option<i64> = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Apply a partial update. Returns `None` if the user does not exist.
pub async fn update_user(
    pool: &SqlitePool,
    user_id: i64,
    patch: &UserPatch,
) -> Result<Option<UserRow>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET
            username      = COALESCE(?, username),
            email         = COALESCE(?, email),
            phone_number  = COALESCE(?, phone_number),
            serial_number = COALESCE(?, serial_number)
         WHERE id = ?",
    )
    .bind(&patch.username)
    .bind(&patch.email)
    .bind(&patch.phone_number)
    .bind(&patch.serial_number)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_user(pool, user_id).await
}

/// Delete a user (profile and owned records cascade). Returns whether a row was removed.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Profiles ────────────────────────────────────────────────

pub async fn get_profile(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        "SELECT user_id, full_name, bio, image, verified FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
#[path = "tests/user_repo_test.rs"]
mod tests;
