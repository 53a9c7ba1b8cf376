use sqlx::SqlitePool;

use super::now_timestamp;

/// Examination record joined with the owning customer's username.
/// `download` is the media-relative path of the uploaded ZIP archive.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExaminationRow {
    pub id: i64,
    pub customer_id: i64,
    pub customer_username: String,
    pub dataset: String,
    pub design_title: String,
    pub last_uid: String,
    pub high_heel: bool,
    pub has_shoe: bool,
    pub single_foot: bool,
    pub download: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewExamination<'a> {
    pub customer_id: i64,
    pub dataset: &'a str,
    pub design_title: &'a str,
    pub last_uid: &'a str,
    pub high_heel: bool,
    pub has_shoe: bool,
    pub single_foot: bool,
    pub download: &'a str,
}

const EXAMINATION_SELECT: &str = "SELECT e.id, e.customer_id, u.username AS customer_username, e.dataset, e.design_title,
            e.last_uid, e.high_heel, e.has_shoe, e.single_foot, e.download, e.created_at
     FROM examinations e JOIN users u ON u.id = e.customer_id";

pub async fn insert_examination(
    pool: &SqlitePool,
    exam: &NewExamination<'_>,
) -> Result<ExaminationRow, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO examinations
            (customer_id, dataset, design_title, last_uid, high_heel, has_shoe, single_foot, download, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(exam.customer_id)
    .bind(exam.dataset)
    .bind(exam.design_title)
    .bind(exam.last_uid)
    .bind(exam.high_heel)
    .bind(exam.has_shoe)
    .bind(exam.single_foot)
    .bind(exam.download)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_examination(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_examination(
    pool: &SqlitePool,
    examination_id: i64,
) -> Result<Option<ExaminationRow>, sqlx::Error> {
    sqlx::query_as::<_, ExaminationRow>(&format!("{EXAMINATION_SELECT} WHERE e.id = ?"))
        .bind(examination_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_examinations(pool: &SqlitePool) -> Result<Vec<ExaminationRow>, sqlx::Error> {
    sqlx::query_as::<_, ExaminationRow>(&format!(
        "{EXAMINATION_SELECT} ORDER BY e.created_at DESC, e.id DESC"
    ))
    .fetch_all(pool)
    .await
}
