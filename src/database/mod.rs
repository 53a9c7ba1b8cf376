//! SQLite record store: one repository module per table family.
//!
//! Repositories are plain async functions over a `SqlitePool` returning
//! `sqlx::Error`; HTTP translation happens in `routes`.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

pub mod bug_repo;
pub mod examination_repo;
pub mod log_repo;
pub mod ticket_repo;
pub mod user_repo;
pub mod version_repo;

/// Timestamp stored in `created_at` / `date_joined` columns.
/// Microsecond precision keeps `ORDER BY created_at` stable for rapid inserts.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Build a case-insensitive `LIKE` pattern for a substring search.
/// Returns `None` for a blank query so callers skip the filter entirely.
pub(crate) fn like_pattern(query: Option<&str>) -> Option<String> {
    let trimmed = query?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let escaped = trimmed
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

/// Append `WHERE (LOWER(a) LIKE ? OR LOWER(b) LIKE ? ...)` for the given columns.
pub(crate) fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], pattern: &str) {
    qb.push(" WHERE (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("LOWER(COALESCE({column}, '')) LIKE "));
        qb.push_bind(pattern.to_string());
        qb.push(" ESCAPE '\\'");
    }
    qb.push(")");
}
